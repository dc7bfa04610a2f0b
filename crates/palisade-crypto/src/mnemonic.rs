//! BIP39 recovery phrase generation, validation, and seed derivation.
//!
//! Palisade generates 12-word (128-bit entropy) phrases; import accepts
//! 12 or 24 words so phrases from other wallets restore cleanly.
//!
//! 1. **Generation**: 128-bit OS entropy → SHA-256 checksum (4 bits) →
//!    132 bits split into 12 × 11-bit wordlist indices.
//! 2. **Validation**: wordlist membership and checksum, delegated to
//!    the `bip39` crate's parser.
//! 3. **Seed derivation**: PBKDF2-HMAC-SHA512 with 2048 rounds,
//!    salt = `"mnemonic" + passphrase`, producing a 64-byte seed.
//!
//! Reference: <https://github.com/bitcoin/bips/blob/master/bip-0039.mediawiki>

use bip39::{Language, Mnemonic};
use palisade_types::{Result, WalletError};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Word counts accepted on import. Generation always uses the first.
const ACCEPTED_WORD_COUNTS: [usize; 2] = [12, 24];

// ---------------------------------------------------------------------------
// MnemonicPhrase
// ---------------------------------------------------------------------------

/// A validated BIP39 mnemonic phrase (space-separated words).
///
/// The inner string is zeroized on drop to prevent the recovery phrase
/// from lingering in memory.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MnemonicPhrase(String);

impl MnemonicPhrase {
    /// Returns the phrase as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the individual words as a vector of string slices.
    pub fn words(&self) -> Vec<&str> {
        self.0.split_whitespace().collect()
    }

    /// Returns the number of words in the phrase.
    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }
}

// MnemonicPhrase does not implement Clone/Debug to prevent leakage.

// ---------------------------------------------------------------------------
// Seed
// ---------------------------------------------------------------------------

/// A 64-byte seed derived from a BIP39 mnemonic via PBKDF2-HMAC-SHA512.
///
/// This seed is the input to HD key derivation for every chain family.
/// Automatically zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    /// Fixed byte length of a BIP39 seed.
    pub const LEN: usize = 64;

    /// Creates a [`Seed`] from a raw 64-byte array.
    ///
    /// Use this for reconstructing a seed from test vectors. For
    /// normal operation, use [`mnemonic_to_seed`].
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 64-byte seed.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

// Seed does not implement Clone/Debug to prevent leakage.

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generates a new random 12-word BIP39 mnemonic.
///
/// Entropy comes from the OS-level CSPRNG; the checksum makes the
/// result valid by construction.
pub fn generate_mnemonic() -> Result<MnemonicPhrase> {
    let mut entropy = [0u8; 16];
    OsRng.fill_bytes(&mut entropy);

    let result = entropy_to_mnemonic(&entropy);

    entropy.zeroize();
    result
}

/// Converts raw 128-bit entropy into a 12-word BIP39 mnemonic.
///
/// This is the deterministic core of mnemonic generation. Exposed for
/// testing with known test vectors.
pub fn entropy_to_mnemonic(entropy: &[u8; 16]) -> Result<MnemonicPhrase> {
    let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy).map_err(|e| {
        WalletError::CryptoError {
            reason: format!("mnemonic generation failed: {e}"),
        }
    })?;
    Ok(MnemonicPhrase(mnemonic.to_string()))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validates a BIP39 mnemonic phrase.
///
/// # Checks performed
///
/// 1. Exactly 12 or 24 words.
/// 2. Every word exists in the BIP39 English wordlist.
/// 3. The embedded checksum matches the reconstructed entropy.
///
/// # Errors
///
/// Returns [`WalletError::InvalidMnemonic`] if any check fails. A
/// phrase is never partially accepted.
pub fn validate_mnemonic(words: &str) -> Result<()> {
    let mut normalized = normalize_phrase(words)?;

    let result = Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map(|_| ())
        .map_err(|e| WalletError::InvalidMnemonic {
            reason: e.to_string(),
        });

    normalized.zeroize();
    result
}

/// Collapses whitespace to single spaces and checks the word count.
///
/// The caller zeroizes the returned string.
fn normalize_phrase(words: &str) -> Result<String> {
    let split: Vec<&str> = words.split_whitespace().collect();
    if !ACCEPTED_WORD_COUNTS.contains(&split.len()) {
        return Err(WalletError::InvalidMnemonic {
            reason: format!("mnemonic must be 12 or 24 words, got {}", split.len()),
        });
    }
    Ok(split.join(" "))
}

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Derives a 64-byte seed from a BIP39 mnemonic and optional passphrase.
///
/// # Process (BIP39 spec)
///
/// - **Password**: the mnemonic sentence (NFKD normalized).
/// - **Salt**: `"mnemonic"` concatenated with `passphrase`.
/// - **Algorithm**: PBKDF2-HMAC-SHA512, 2048 rounds, 64-byte output.
///
/// Deterministic and side-effect-free: the same mnemonic + passphrase
/// always yields the byte-identical seed. This property is what makes
/// accounts recoverable from a backup phrase.
///
/// # Errors
///
/// Returns [`WalletError::InvalidMnemonic`] if the phrase fails
/// validation.
pub fn mnemonic_to_seed(words: &str, passphrase: &str) -> Result<Seed> {
    let mut normalized = normalize_phrase(words)?;

    let result = Mnemonic::parse_in_normalized(Language::English, &normalized).map_err(|e| {
        WalletError::InvalidMnemonic {
            reason: e.to_string(),
        }
    });

    normalized.zeroize();

    Ok(Seed(result?.to_seed_normalized(passphrase)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_12_words() -> Result<()> {
        let phrase = generate_mnemonic()?;
        assert_eq!(phrase.word_count(), 12);
        Ok(())
    }

    #[test]
    fn generated_mnemonic_validates() -> Result<()> {
        let phrase = generate_mnemonic()?;
        validate_mnemonic(phrase.as_str())
    }

    /// BIP39 test vector: 128 bits of 0x00.
    /// Expected mnemonic: "abandon" × 11 + "about".
    #[test]
    fn entropy_all_zeros() -> Result<()> {
        let phrase = entropy_to_mnemonic(&[0x00; 16])?;
        let words = phrase.words();
        assert_eq!(words.len(), 12);
        for word in &words[..11] {
            assert_eq!(*word, "abandon");
        }
        assert_eq!(words[11], "about");
        Ok(())
    }

    /// BIP39 test vector: 128 bits of 0xFF.
    /// Expected mnemonic: "zoo" × 11 + "wrong".
    #[test]
    fn entropy_all_ff() -> Result<()> {
        let phrase = entropy_to_mnemonic(&[0xFF; 16])?;
        let words = phrase.words();
        for word in &words[..11] {
            assert_eq!(*word, "zoo");
        }
        assert_eq!(words[11], "wrong");
        Ok(())
    }

    #[test]
    fn validate_rejects_wrong_word_count() {
        assert!(validate_mnemonic("abandon abandon abandon").is_err());
    }

    #[test]
    fn validate_rejects_invalid_word() {
        let mut words = vec!["abandon"; 11];
        words.push("notaword");
        assert!(validate_mnemonic(&words.join(" ")).is_err());
    }

    #[test]
    fn validate_rejects_bad_checksum() {
        // 12 × "abandon" has wrong checksum (last word should be "about").
        let phrase = vec!["abandon"; 12].join(" ");
        assert!(validate_mnemonic(&phrase).is_err());
    }

    #[test]
    fn validate_accepts_24_words_on_import() -> Result<()> {
        // 24-word phrase from all-zero 256-bit entropy.
        let mut words = vec!["abandon"; 23];
        words.push("art");
        validate_mnemonic(&words.join(" "))
    }

    /// TREZOR BIP39 test vector: all-zero 128-bit entropy + passphrase
    /// "TREZOR".
    #[test]
    fn seed_derivation_trezor_vector() -> Result<()> {
        let mnemonic = "abandon abandon abandon abandon abandon abandon \
                        abandon abandon abandon abandon abandon about";

        let seed = mnemonic_to_seed(mnemonic, "TREZOR")?;

        let expected = hex::decode(
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e5349553\
             1f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04",
        )
        .expect("valid hex");
        assert_eq!(seed.as_bytes().as_slice(), expected.as_slice());
        Ok(())
    }

    #[test]
    fn seed_with_empty_passphrase_differs() -> Result<()> {
        let mnemonic = "abandon abandon abandon abandon abandon abandon \
                        abandon abandon abandon abandon abandon about";

        let seed_no_pass = mnemonic_to_seed(mnemonic, "")?;
        let seed_with_pass = mnemonic_to_seed(mnemonic, "TREZOR")?;
        assert_ne!(seed_no_pass.as_bytes(), seed_with_pass.as_bytes());
        Ok(())
    }

    #[test]
    fn seed_is_deterministic() -> Result<()> {
        let mnemonic = "abandon abandon abandon abandon abandon abandon \
                        abandon abandon abandon abandon abandon about";

        let s1 = mnemonic_to_seed(mnemonic, "test")?;
        let s2 = mnemonic_to_seed(mnemonic, "test")?;
        assert_eq!(s1.as_bytes(), s2.as_bytes());
        Ok(())
    }

    #[test]
    fn seed_rejects_invalid_mnemonic() {
        let result = mnemonic_to_seed("not a valid phrase at all", "");
        assert!(matches!(result, Err(WalletError::InvalidMnemonic { .. })));
    }
}
