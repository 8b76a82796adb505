use sha2::{Digest, Sha256};

const HASH_LEN: usize = 8;

/// Builds a deterministic template logical id from a construct path.
///
/// The readable part keeps the ASCII alphanumerics of every path component;
/// the suffix is the first eight uppercase hex digits of the SHA-256 of the
/// `/`-joined path, so distinct paths that collapse to the same readable
/// text still get distinct ids.
pub fn logical_id(path: &[&str]) -> String {
    let readable: String = path
        .iter()
        .flat_map(|component| component.chars())
        .filter(char::is_ascii_alphanumeric)
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(path.join("/"));
    let digest = format!("{:X}", hasher.finalize());

    format!("{readable}{}", &digest[..HASH_LEN])
}
