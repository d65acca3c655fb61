//! Text normalisation for the results file

/// Replaces Serbian/Montenegrin diacritics with plain ASCII letters
///
/// Dj is written as "dj"/"Dj" so names keep their pronunciation.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'š' => out.push('s'),
            'Š' => out.push('S'),
            'č' | 'ć' => out.push('c'),
            'Č' | 'Ć' => out.push('C'),
            'ž' => out.push('z'),
            'Ž' => out.push('Z'),
            'đ' => out.push_str("dj"),
            'Đ' => out.push_str("Dj"),
            other => out.push(other),
        }
    }
    out
}
