//! Credential hashing
//!
//! Devices never see the clear-text password. The login body carries
//! the XM variant of MD5: digest the password, add consecutive digest
//! byte pairs modulo 62, map each sum into `0-9A-Za-z`, and keep the
//! first eight characters.

const ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Hash a password the way the login exchange expects.
pub fn xm_md5(password: &str) -> String {
    let digest = md5::compute(password.as_bytes());
    digest
        .chunks(2)
        .map(|pair| {
            let sum = pair[0] as usize + pair[1] as usize;
            ALPHABET[sum % ALPHABET.len()] as char
        })
        .take(8)
        .collect()
}
