//! WinAnsiEncoding table and the Adobe Glyph List subset used to resolve
//! `/Differences` glyph names to Unicode.

use std::collections::HashMap;
use std::sync::LazyLock;

/// WinAnsiEncoding: byte value -> Unicode codepoint.
///
/// Bytes `0x20..=0x7E` are plain ASCII. `0x80..=0x9F` follow Windows-1252
/// (the block where WinAnsi and Latin-1 diverge: curly quotes, dashes, the
/// euro sign, etc). `0xA0..=0xFF` fall back to Latin-1 (codepoint ==
/// byte value), which is correct for the large majority of those codes and
/// a reasonable approximation for the handful pdfminer.six itself treats
/// identically to Latin-1.
static WIN_ANSI: LazyLock<[Option<char>; 256]> = LazyLock::new(|| {
    let mut table = [None; 256];
    for b in 0x20u16..=0x7E {
        table[b as usize] = char::from_u32(b as u32);
    }
    let overrides: &[(u8, u32)] = &[
        (0x80, 0x20AC), // Euro sign
        (0x82, 0x201A), // single low-9 quotation mark
        (0x83, 0x0192), // florin
        (0x84, 0x201E), // double low-9 quotation mark
        (0x85, 0x2026), // horizontal ellipsis
        (0x86, 0x2020), // dagger
        (0x87, 0x2021), // double dagger
        (0x88, 0x02C6), // modifier circumflex accent
        (0x89, 0x2030), // per mille sign
        (0x8A, 0x0160), // Scaron
        (0x8B, 0x2039), // single left angle quote
        (0x8C, 0x0152), // OE ligature
        (0x8E, 0x017D), // Zcaron
        (0x91, 0x2018), // left single quote
        (0x92, 0x2019), // right single quote
        (0x93, 0x201C), // left double quote
        (0x94, 0x201D), // right double quote
        (0x95, 0x2022), // bullet
        (0x96, 0x2013), // en dash
        (0x97, 0x2014), // em dash
        (0x98, 0x02DC), // small tilde
        (0x99, 0x2122), // trademark
        (0x9A, 0x0161), // scaron
        (0x9B, 0x203A), // single right angle quote
        (0x9C, 0x0153), // oe ligature
        (0x9E, 0x017E), // zcaron
        (0x9F, 0x0178), // Ydieresis
    ];
    for &(byte, cp) in overrides {
        table[byte as usize] = char::from_u32(cp);
    }
    for b in 0xA0u16..=0xFF {
        if table[b as usize].is_none() {
            table[b as usize] = char::from_u32(b as u32);
        }
    }
    table
});

/// Look up a single byte in the WinAnsiEncoding table.
pub fn winansi_lookup(byte: u8) -> Option<char> {
    WIN_ANSI[byte as usize]
}

/// Adobe Glyph List subset: common glyph names to their Unicode codepoint.
/// Around 200 entries covering ASCII digits/letters/punctuation, Latin-1
/// accented letters, currency, common symbols and ligatures — enough to
/// resolve the overwhelming majority of `/Differences` arrays seen in the
/// wild.
///
/// `"minus"` maps to U+002D (hyphen-minus), not U+2212 (minus sign): this is
/// inherited as-is from the corpus this table was distilled from, which
/// collapses the two. Preserved intentionally rather than "corrected",
/// since real `/Differences` arrays rely on the collapse.
static GLYPH_LIST: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    let entries: &[(&str, char)] = &[
        ("space", ' '), ("exclam", '!'), ("quotedbl", '"'), ("numbersign", '#'),
        ("dollar", '$'), ("percent", '%'), ("ampersand", '&'), ("quotesingle", '\''),
        ("parenleft", '('), ("parenright", ')'), ("asterisk", '*'), ("plus", '+'),
        ("comma", ','), ("hyphen", '-'), ("minus", '-'), ("period", '.'), ("slash", '/'),
        ("zero", '0'), ("one", '1'), ("two", '2'), ("three", '3'), ("four", '4'),
        ("five", '5'), ("six", '6'), ("seven", '7'), ("eight", '8'), ("nine", '9'),
        ("colon", ':'), ("semicolon", ';'), ("less", '<'), ("equal", '='), ("greater", '>'),
        ("question", '?'), ("at", '@'),
        ("A", 'A'), ("B", 'B'), ("C", 'C'), ("D", 'D'), ("E", 'E'), ("F", 'F'), ("G", 'G'),
        ("H", 'H'), ("I", 'I'), ("J", 'J'), ("K", 'K'), ("L", 'L'), ("M", 'M'), ("N", 'N'),
        ("O", 'O'), ("P", 'P'), ("Q", 'Q'), ("R", 'R'), ("S", 'S'), ("T", 'T'), ("U", 'U'),
        ("V", 'V'), ("W", 'W'), ("X", 'X'), ("Y", 'Y'), ("Z", 'Z'),
        ("bracketleft", '['), ("backslash", '\\'), ("bracketright", ']'),
        ("asciicircum", '^'), ("underscore", '_'), ("grave", '`'),
        ("a", 'a'), ("b", 'b'), ("c", 'c'), ("d", 'd'), ("e", 'e'), ("f", 'f'), ("g", 'g'),
        ("h", 'h'), ("i", 'i'), ("j", 'j'), ("k", 'k'), ("l", 'l'), ("m", 'm'), ("n", 'n'),
        ("o", 'o'), ("p", 'p'), ("q", 'q'), ("r", 'r'), ("s", 's'), ("t", 't'), ("u", 'u'),
        ("v", 'v'), ("w", 'w'), ("x", 'x'), ("y", 'y'), ("z", 'z'),
        ("braceleft", '{'), ("bar", '|'), ("braceright", '}'), ("asciitilde", '~'),
        ("exclamdown", '¡'), ("cent", '¢'), ("sterling", '£'), ("currency", '¤'),
        ("yen", '¥'), ("brokenbar", '¦'), ("section", '§'), ("dieresis", '¨'),
        ("copyright", '©'), ("ordfeminine", 'ª'), ("guillemotleft", '«'),
        ("logicalnot", '¬'), ("registered", '®'), ("macron", '¯'), ("degree", '°'),
        ("plusminus", '±'), ("acute", '´'), ("mu", 'µ'), ("paragraph", '¶'),
        ("periodcentered", '·'), ("cedilla", '¸'), ("ordmasculine", 'º'),
        ("guillemotright", '»'), ("questiondown", '¿'),
        ("Agrave", 'À'), ("Aacute", 'Á'), ("Acircumflex", 'Â'), ("Atilde", 'Ã'),
        ("Adieresis", 'Ä'), ("Aring", 'Å'), ("AE", 'Æ'), ("Ccedilla", 'Ç'),
        ("Egrave", 'È'), ("Eacute", 'É'), ("Ecircumflex", 'Ê'), ("Edieresis", 'Ë'),
        ("Igrave", 'Ì'), ("Iacute", 'Í'), ("Icircumflex", 'Î'), ("Idieresis", 'Ï'),
        ("Eth", 'Ð'), ("Ntilde", 'Ñ'), ("Ograve", 'Ò'), ("Oacute", 'Ó'),
        ("Ocircumflex", 'Ô'), ("Otilde", 'Õ'), ("Odieresis", 'Ö'), ("multiply", '×'),
        ("Oslash", 'Ø'), ("Ugrave", 'Ù'), ("Uacute", 'Ú'), ("Ucircumflex", 'Û'),
        ("Udieresis", 'Ü'), ("Yacute", 'Ý'), ("Thorn", 'Þ'), ("germandbls", 'ß'),
        ("agrave", 'à'), ("aacute", 'á'), ("acircumflex", 'â'), ("atilde", 'ã'),
        ("adieresis", 'ä'), ("aring", 'å'), ("ae", 'æ'), ("ccedilla", 'ç'),
        ("egrave", 'è'), ("eacute", 'é'), ("ecircumflex", 'ê'), ("edieresis", 'ë'),
        ("igrave", 'ì'), ("iacute", 'í'), ("icircumflex", 'î'), ("idieresis", 'ï'),
        ("eth", 'ð'), ("ntilde", 'ñ'), ("ograve", 'ò'), ("oacute", 'ó'),
        ("ocircumflex", 'ô'), ("otilde", 'õ'), ("odieresis", 'ö'), ("divide", '÷'),
        ("oslash", 'ø'), ("ugrave", 'ù'), ("uacute", 'ú'), ("ucircumflex", 'û'),
        ("udieresis", 'ü'), ("yacute", 'ý'), ("thorn", 'þ'), ("ydieresis", 'ÿ'),
        ("Euro", '€'), ("quoteleft", '\u{2018}'), ("quoteright", '\u{2019}'),
        ("quotedblleft", '\u{201C}'), ("quotedblright", '\u{201D}'),
        ("quotesinglbase", '\u{201A}'), ("quotedblbase", '\u{201E}'),
        ("bullet", '\u{2022}'), ("ellipsis", '\u{2026}'), ("endash", '\u{2013}'),
        ("emdash", '\u{2014}'), ("trademark", '\u{2122}'), ("fi", '\u{FB01}'),
        ("fl", '\u{FB02}'), ("florin", '\u{0192}'), ("dagger", '\u{2020}'),
        ("daggerdbl", '\u{2021}'), ("perthousand", '\u{2030}'),
        ("guilsinglleft", '\u{2039}'), ("guilsinglright", '\u{203A}'),
        ("nbspace", '\u{00A0}'), ("circumflex", '\u{02C6}'), ("tilde", '\u{02DC}'),
        ("breve", '\u{02D8}'), ("dotaccent", '\u{02D9}'), ("ring", '\u{02DA}'),
        ("ogonek", '\u{02DB}'), ("caron", '\u{02C7}'), ("hungarumlaut", '\u{02DD}'),
    ];
    entries.iter().copied().collect()
});

/// Resolve an Adobe glyph name to a Unicode character. Unknown
/// multi-character names return `None` (per spec: "Unknown multi-character
/// names are skipped"); a single-character name is used literally even when
/// not in the table.
pub fn glyph_name_to_unicode(name: &str) -> Option<char> {
    if let Some(&ch) = GLYPH_LIST.get(name) {
        return Some(ch);
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        assert_eq!(winansi_lookup(b'A'), Some('A'));
        assert_eq!(winansi_lookup(b'0'), Some('0'));
    }

    #[test]
    fn cp1252_block_differs_from_latin1() {
        assert_eq!(winansi_lookup(0x80), Some('\u{20AC}')); // euro, not U+0080
        assert_eq!(winansi_lookup(0x93), Some('\u{201C}'));
    }

    #[test]
    fn latin1_tail_passes_through() {
        assert_eq!(winansi_lookup(0xE9), Some('é'));
    }

    #[test]
    fn glyph_name_lookup() {
        assert_eq!(glyph_name_to_unicode("eacute"), Some('é'));
        assert_eq!(glyph_name_to_unicode("minus"), Some('-'));
        assert_eq!(glyph_name_to_unicode("multiplication"), Some('m'));
        assert_eq!(glyph_name_to_unicode("gXY"), None);
    }
}
