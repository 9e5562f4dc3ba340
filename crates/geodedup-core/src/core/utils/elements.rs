use phf::{Set, phf_set};

static ELEMENT_SYMBOLS: Set<&'static str> = phf_set! {
    "H", "HE",
    "LI", "BE", "B", "C", "N", "O", "F", "NE",
    "NA", "MG", "AL", "SI", "P", "S", "CL", "AR",
    "K", "CA", "SC", "TI", "V", "CR", "MN", "FE", "CO", "NI", "CU", "ZN",
    "GA", "GE", "AS", "SE", "BR", "KR",
    "RB", "SR", "Y", "ZR", "NB", "MO", "TC", "RU", "RH", "PD", "AG", "CD",
    "IN", "SN", "SB", "TE", "I", "XE",
    "CS", "BA", "LA", "CE", "PR", "ND", "PM", "SM", "EU", "GD", "TB", "DY",
    "HO", "ER", "TM", "YB", "LU", "HF", "TA", "W", "RE", "OS", "IR", "PT",
    "AU", "HG", "TL", "PB", "BI", "PO", "AT", "RN",
    "FR", "RA", "AC", "TH", "PA", "U", "NP", "PU", "AM", "CM", "BK", "CF",
    "ES", "FM", "MD", "NO", "LR",
    "D", "X", "DA",
};

/// Canonical comparison key of an element symbol: trimmed and upper-cased.
pub fn element_key(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

/// Returns `true` for element symbols (any case) found in the periodic table, plus
/// deuterium and the dummy-atom symbols `X`/`DA` accepted by quantum chemistry codes.
pub fn is_known_element(symbol: &str) -> bool {
    ELEMENT_SYMBOLS.contains(element_key(symbol).as_str())
}
