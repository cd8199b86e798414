//! Transliteration to Latin script.

/// Latin replacement for a lowercase Cyrillic letter.
fn latin_for(lower: char) -> Option<&'static str> {
    let latin = match lower {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' => "",
        'ы' => "y",
        'ь' => "",
        'э' => "e",
        'ю' => "ju",
        'я' => "ja",
        // Ukrainian and Belarusian letters outside the Russian alphabet.
        'і' => "i",
        'ї' => "ji",
        'є' => "je",
        'ґ' => "g",
        'ў' => "u",
        _ => return None,
    };
    Some(latin)
}

/// Transliterates a title to Latin script.
///
/// Cyrillic letters use the table above and keep the case of their first
/// letter. Other non-ASCII characters go through `deunicode`; characters it
/// has no mapping for pass through untouched.
pub fn transliterate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for ch in input.chars() {
        let lower = ch.to_lowercase().next().unwrap_or(ch);
        match latin_for(lower) {
            Some(latin) if ch != lower => {
                let mut chars = latin.chars();
                if let Some(first) = chars.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                }
            }
            Some(latin) => out.push_str(latin),
            None if ch.is_ascii() => out.push(ch),
            None => match deunicode::deunicode_char(ch) {
                Some(ascii) => out.push_str(ascii),
                None => out.push(ch),
            },
        }
    }

    out
}
