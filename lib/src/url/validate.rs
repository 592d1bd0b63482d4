/// Takes a set of sets of byte characters, return a 2^8 array with non-zero
/// values at the indices corresponding to the character byte values.
const fn char_table(sets: &[&[u8]]) -> [u8; 256] {
    let mut table = [0u8; 256];

    let mut i = 0;
    while i < sets.len() {
        let set: &[u8] = sets[i];

        let mut j = 0;
        while j < set.len() {
            let c: u8 = set[j];
            table[c as usize] = c;
            j += 1;
        }

        i += 1;
    }

    table
}

const ALPHA: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const DIGIT: &[u8] = b"0123456789";

const PCT_ENCODED: &[u8] = b"%ABCDEFabcdef0123456789";

const SUB_DELIMS: &[u8] = b"!$&'()*+,;=";

const SCHEME_CHARS: [u8; 256] = char_table(&[ALPHA, DIGIT, b"+-."]);

const UNRESERVED: [u8; 256] = char_table(&[ALPHA, DIGIT, b"-._~"]);

const REG_NAME_CHARS: [u8; 256] = char_table(&[&UNRESERVED, PCT_ENCODED, SUB_DELIMS]);

/// Characters allowed in a resource path: RFC 3986 `pchar` plus `/`. Query
/// and fragment delimiters are excluded since they never name a resource.
const PATH_CHARS: [u8; 256] = char_table(&[&REG_NAME_CHARS, b":@/"]);

const URL_CHARS: [u8; 256] = char_table(&[
    &SCHEME_CHARS, &PATH_CHARS, b"?#",

    // NOTE: these are _not_ accepted in RFC 7230/3986. However, browsers
    // routinely send these unencoded, so allow them to support the real-world.
    b"{}[]\\^`|",
]);

#[inline(always)]
pub const fn is_url_char(&c: &u8) -> bool { URL_CHARS[c as usize] != 0 }

#[inline(always)]
pub const fn is_path_char(&c: &u8) -> bool { PATH_CHARS[c as usize] != 0 }

#[cfg(test)]
mod tests {
    use super::*;

    fn test_char_table(table: &[u8]) {
        for (i, &v) in table.iter().enumerate() {
            if v != 0 {
                assert_eq!(i, v as usize);
            }
        }
    }

    #[test]
    fn check_tables() {
        test_char_table(&URL_CHARS[..]);
        test_char_table(&PATH_CHARS[..]);
    }

    #[test]
    fn paths_exclude_query_and_fragment() {
        assert!(is_path_char(&b'/'));
        assert!(is_path_char(&b'~'));
        assert!(!is_path_char(&b'?'));
        assert!(!is_path_char(&b'#'));
        assert!(!is_path_char(&b' '));
        assert!(is_url_char(&b'?'));
        assert!(!is_url_char(&b' '));
    }
}
