//! Small helpers shared by the library and the CLI.

use rand::Rng;
use serde::Serialize;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// Render a value as JSON with two-space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Pretty-print a value as JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", to_pretty_json(value)?);
    Ok(())
}

/// Generate an initial password shaped `Upper Lower Lower Digit x5`, e.g. `Kqz04719`.
pub fn gen_password() -> String {
    let mut rng = rand::thread_rng();
    let mut password = String::with_capacity(8);

    password.push(pick(&mut rng, UPPERCASE));
    for _ in 0..2 {
        password.push(pick(&mut rng, LOWERCASE));
    }
    for _ in 0..5 {
        password.push(pick(&mut rng, DIGITS));
    }

    password
}

fn pick<R: Rng>(rng: &mut R, alphabet: &[u8]) -> char {
    alphabet[rng.gen_range(0..alphabet.len())] as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gen_password_shape() {
        for _ in 0..50 {
            let password = gen_password();
            let chars: Vec<char> = password.chars().collect();

            assert_eq!(chars.len(), 8);
            assert!(chars[0].is_ascii_uppercase());
            assert!(chars[1..3].iter().all(|c| c.is_ascii_lowercase()));
            assert!(chars[3..].iter().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_to_pretty_json_indents_two_spaces() {
        let rendered = to_pretty_json(&json!({"skuId": "abc"})).unwrap();
        assert_eq!(rendered, "{\n  \"skuId\": \"abc\"\n}");
    }
}
