/// ISO 3166-1 alpha-2 → numeric
const ISO_NUMERIC: &[(&str, u16)] = &[
    ("AD", 20),
    ("AT", 40),
    ("AU", 36),
    ("BE", 56),
    ("BG", 100),
    ("CA", 124),
    ("CH", 756),
    ("CN", 156),
    ("CY", 196),
    ("CZ", 203),
    ("DE", 276),
    ("DK", 208),
    ("EE", 233),
    ("ES", 724),
    ("FI", 246),
    ("FO", 234),
    ("FR", 250),
    ("GB", 826),
    ("GL", 304),
    ("GR", 300),
    ("HR", 191),
    ("HU", 348),
    ("IE", 372),
    ("IS", 352),
    ("IT", 380),
    ("JP", 392),
    ("LI", 438),
    ("LT", 440),
    ("LU", 442),
    ("LV", 428),
    ("MC", 492),
    ("MT", 470),
    ("NL", 528),
    ("NO", 578),
    ("NZ", 554),
    ("PL", 616),
    ("PT", 620),
    ("RO", 642),
    ("RS", 688),
    ("SE", 752),
    ("SI", 705),
    ("SK", 703),
    ("TR", 792),
    ("UA", 804),
    ("US", 840),
];

/// 国コード（alpha-2）を ISO 数値コードに変換。未知のコードは None
pub fn iso_numeric(alpha2: &str) -> Option<u16> {
    let code = alpha2.trim().to_uppercase();
    ISO_NUMERIC
        .iter()
        .find(|(alpha, _)| *alpha == code)
        .map(|(_, numeric)| *numeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(iso_numeric("DK"), Some(208));
        assert_eq!(iso_numeric("se"), Some(752));
        assert_eq!(iso_numeric(" DE "), Some(276));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(iso_numeric("XX"), None);
        assert_eq!(iso_numeric(""), None);
    }
}
