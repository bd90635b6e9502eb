//! Names for groups derived at assignment time

use ring::digest::{digest, SHA256};

/// Longest generated group name, in characters
///
/// Group names end up in artifact filenames, which are limited to 255 characters. Artifact naming adds a prefix of up
/// to 3 characters and a suffix of up to 6.
pub const MAX_GROUP_NAME_LEN: usize = 246;

/// Number of digest bytes kept by [`hash_name`]
const HASH_LEN: usize = 8;

/// The group name used for targets of `package_path` matched by a `subfolders` mapping of `group_name`
///
/// Names that would exceed [`MAX_GROUP_NAME_LEN`] characters are replaced by [`hash_name`] of the full name. The
/// hashed form keeps `group_name` as its prefix, so it only fits the limit when `group_name` is at most 229 characters.
pub fn subfolder_name(group_name: &str, package_path: &str) -> String {
    let base_name = format!("{}_{}", group_name, package_path.replace('/', "_"));
    if base_name.chars().count() > MAX_GROUP_NAME_LEN {
        hash_name(group_name, &base_name)
    } else {
        base_name
    }
}

/// Appends a stable hash of `name` to `prefix`
///
/// The hash is a truncated SHA-256 digest, so it is identical across processes, platforms and releases. Generated
/// names feed into artifact paths and cache keys, so this must never change.
pub fn hash_name(prefix: &str, name: &str) -> String {
    let digest = digest(&SHA256, name.as_bytes());
    format!("{}_{}", prefix, hex::encode(&digest.as_ref()[..HASH_LEN]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subfolder_name_joins_package_path() {
        assert_eq!(subfolder_name("deps", "third-party/zlib"), "deps_third-party_zlib");
        assert_eq!(subfolder_name("deps", "foo"), "deps_foo");
        assert_eq!(subfolder_name("deps", ""), "deps_");
    }

    #[test]
    fn hash_name_is_stable() {
        assert_eq!(hash_name("linkgroup", "some name"), hash_name("linkgroup", "some name"));
        assert_ne!(hash_name("linkgroup", "some name"), hash_name("linkgroup", "other name"));

        let hashed = hash_name("linkgroup", "");
        // SHA-256 of the empty string starts with e3b0c44298fc1c14
        assert_eq!(hashed, "linkgroup_e3b0c44298fc1c14");
    }

    #[test]
    fn long_subfolder_name_is_hashed() {
        let package_path = ["very", "long", "path"].repeat(40).join("/");
        let base_name = format!("linkgroup_{}", package_path.replace('/', "_"));
        assert!(base_name.len() > MAX_GROUP_NAME_LEN);

        let name = subfolder_name("linkgroup", &package_path);
        assert_eq!(name, hash_name("linkgroup", &base_name));
        assert!(name.starts_with("linkgroup_"));
        assert_eq!(name.len(), "linkgroup_".len() + 2 * HASH_LEN);
        assert_eq!(name, subfolder_name("linkgroup", &package_path));
    }

    #[test]
    fn subfolder_name_length_boundary() {
        // "g_" plus the package path
        let fits = "a".repeat(MAX_GROUP_NAME_LEN - 2);
        assert_eq!(subfolder_name("g", &fits), format!("g_{}", fits));

        let too_long = "a".repeat(MAX_GROUP_NAME_LEN - 1);
        let name = subfolder_name("g", &too_long);
        assert_eq!(name, hash_name("g", &format!("g_{}", too_long)));
        assert!(name.len() <= MAX_GROUP_NAME_LEN);
    }

    #[test]
    fn length_is_counted_in_characters() {
        // 152 characters, but 302 bytes
        let package_path = "é".repeat(150);
        let name = subfolder_name("g", &package_path);
        assert_eq!(name, format!("g_{}", package_path));

        let too_long = "é".repeat(MAX_GROUP_NAME_LEN - 1);
        let name = subfolder_name("g", &too_long);
        assert_eq!(name, hash_name("g", &format!("g_{}", too_long)));
    }

    #[test]
    fn long_group_name_outgrows_limit_when_hashed() {
        let group_name = "g".repeat(240);
        let name = subfolder_name(&group_name, "pkg");
        assert_eq!(name, hash_name(&group_name, &format!("{}_pkg", group_name)));
        assert_eq!(name.chars().count(), 240 + 1 + 2 * HASH_LEN);
        assert!(name.chars().count() > MAX_GROUP_NAME_LEN);

        let group_name = "g".repeat(MAX_GROUP_NAME_LEN - 1 - 2 * HASH_LEN);
        let name = subfolder_name(&group_name, &"p".repeat(MAX_GROUP_NAME_LEN));
        assert_eq!(name.chars().count(), MAX_GROUP_NAME_LEN);
    }
}
