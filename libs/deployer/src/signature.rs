use ethers::{
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder},
    types::{Bytes, H256, U256},
};
use eyre::{eyre, Context};

pub const SIGNATURE_LENGTH: usize = 65;

/// Derive the signing wallet at `index` from a BIP-39 mnemonic, using the
/// standard Ethereum derivation path `m/44'/60'/0'/0/{index}`.
pub fn derive_wallet(mnemonic: &str, index: u32) -> eyre::Result<LocalWallet> {
    MnemonicBuilder::<English>::default()
        .phrase(mnemonic)
        .index(index)
        .context("Invalid derivation index")?
        .build()
        .context("Failed to derive wallet from mnemonic")
}

/// Fixed-layout signature: `r || s || v`.
///
/// `r` and `s` are 32 bytes each, big-endian and zero-padded, `v` is a single
/// byte, 65 bytes in total whatever the magnitude of the components.
pub fn encode_signature(r: U256, s: U256, v: u64) -> eyre::Result<[u8; SIGNATURE_LENGTH]> {
    let v = u8::try_from(v).map_err(|_| eyre!("Recovery id {} does not fit one byte", v))?;
    let mut out = [0u8; SIGNATURE_LENGTH];
    r.to_big_endian(&mut out[..32]);
    s.to_big_endian(&mut out[32..64]);
    out[64] = v;
    Ok(out)
}

/// Sign a Safe transaction hash as-is, without the personal message prefix.
pub fn sign_safe_hash(wallet: &LocalWallet, hash: H256) -> eyre::Result<Bytes> {
    let signature = wallet
        .sign_hash(hash)
        .context("Failed to sign Safe transaction hash")?;
    let encoded = encode_signature(signature.r, signature.s, signature.v)?;
    Ok(Bytes::from(encoded.to_vec()))
}
