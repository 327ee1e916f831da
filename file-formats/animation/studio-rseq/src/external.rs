//! Companion file conventions
//!
//! A sequence may ship with additional data in a sibling file named by
//! swapping the extension for `.rseq_ext`. Discovery and loading are the
//! caller's concern; converters only ever see the loaded bytes.

use std::path::{Path, PathBuf};

/// The path a sequence's companion file would live at
pub fn companion_path(sequence: &Path) -> PathBuf {
    sequence.with_extension("rseq_ext")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_path() {
        assert_eq!(
            companion_path(Path::new("anims/run.rseq")),
            Path::new("anims/run.rseq_ext")
        );
        assert_eq!(
            companion_path(Path::new("run")),
            Path::new("run.rseq_ext")
        );
    }
}
