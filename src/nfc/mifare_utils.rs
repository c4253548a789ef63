use aes::Aes128;
use block_modes::block_padding::NoPadding;
use block_modes::cipher::{BlockCipher, BlockDecrypt, BlockEncrypt, NewBlockCipher};
use block_modes::{BlockMode, Cbc};
use des::{TdesEde2, TdesEde3};
use generic_array::GenericArray;
use rand::RngCore;
use zeroize::Zeroize;

use super::mifare_desfire::DesfireKey;
use super::utils::*;

/// Legacy DESFire authentication deciphers everything the reader sends, so
/// the reader side runs CBC "encryption" with the block directions swapped.
struct MiFareTdes {
    cipher: TdesEde2,
}

impl MiFareTdes {
    fn new(key: &[u8]) -> Self {
        let mut v = Vec::with_capacity(16);
        v.extend(key);

        if key.len() == 8 {
            v.extend(key);
        }

        let cipher = TdesEde2::new(GenericArray::from_slice(&v));
        v.zeroize();

        MiFareTdes { cipher }
    }
}

impl BlockCipher for MiFareTdes {
    type BlockSize = <TdesEde2 as BlockCipher>::BlockSize;
    type ParBlocks = <TdesEde2 as BlockCipher>::ParBlocks;
}

impl BlockEncrypt for MiFareTdes {
    fn encrypt_block(&self, block: &mut GenericArray<u8, Self::BlockSize>) {
        self.cipher.decrypt_block(block)
    }
}

impl BlockDecrypt for MiFareTdes {
    fn decrypt_block(&self, block: &mut GenericArray<u8, Self::BlockSize>) {
        self.cipher.encrypt_block(block)
    }
}

const LEGACY_IV: [u8; 8] = [0; 8];

fn check_blocks(block_size: usize, iv: &[u8], value: &[u8]) -> NfcResult<()> {
    if iv.len() != block_size || value.len() % block_size != 0 {
        return Err(NfcError::CryptoError);
    }
    Ok(())
}

fn encrypt_with<C>(cipher: C, iv: &[u8], value: &[u8]) -> Vec<u8>
where
    C: BlockCipher + BlockEncrypt + BlockDecrypt,
{
    Cbc::<C, NoPadding>::new(cipher, GenericArray::from_slice(iv)).encrypt_vec(value)
}

fn decrypt_with<C>(cipher: C, iv: &[u8], value: &[u8]) -> NfcResult<Vec<u8>>
where
    C: BlockCipher + BlockEncrypt + BlockDecrypt,
{
    Ok(Cbc::<C, NoPadding>::new(cipher, GenericArray::from_slice(iv)).decrypt_vec(value)?)
}

fn tdes2_cipher(key: &[u8]) -> TdesEde2 {
    MiFareTdes::new(key).cipher
}

/// Reader to card, legacy mode: every block is deciphered after chaining
pub fn legacy_send(key: &[u8], value: &[u8]) -> NfcResult<Vec<u8>> {
    check_blocks(8, &LEGACY_IV, value)?;
    Ok(encrypt_with(MiFareTdes::new(key), &LEGACY_IV, value))
}

/// Card to reader, legacy mode: plain CBC deciphering with a zero IV
pub fn legacy_receive(key: &[u8], value: &[u8]) -> NfcResult<Vec<u8>> {
    check_blocks(8, &LEGACY_IV, value)?;
    decrypt_with(tdes2_cipher(key), &LEGACY_IV, value)
}

/// Card side counterpart of [`legacy_receive`]
pub fn legacy_card_send(key: &[u8], value: &[u8]) -> NfcResult<Vec<u8>> {
    check_blocks(8, &LEGACY_IV, value)?;
    Ok(encrypt_with(tdes2_cipher(key), &LEGACY_IV, value))
}

/// Card side counterpart of [`legacy_send`]
pub fn legacy_card_receive(key: &[u8], value: &[u8]) -> NfcResult<Vec<u8>> {
    check_blocks(8, &LEGACY_IV, value)?;
    decrypt_with(MiFareTdes::new(key), &LEGACY_IV, value)
}

pub fn cbc_encrypt(key: &DesfireKey, iv: &[u8], value: &[u8]) -> NfcResult<Vec<u8>> {
    check_blocks(key.block_size(), iv, value)?;

    Ok(match key {
        DesfireKey::Des(k) => encrypt_with(tdes2_cipher(k), iv, value),
        DesfireKey::TripleDes(k) => encrypt_with(tdes2_cipher(k), iv, value),
        DesfireKey::ThreeK3Des(k) => encrypt_with(TdesEde3::new(GenericArray::from_slice(k)), iv, value),
        DesfireKey::Aes(k) => encrypt_with(Aes128::new(GenericArray::from_slice(k)), iv, value),
    })
}

pub fn cbc_decrypt(key: &DesfireKey, iv: &[u8], value: &[u8]) -> NfcResult<Vec<u8>> {
    check_blocks(key.block_size(), iv, value)?;

    match key {
        DesfireKey::Des(k) => decrypt_with(tdes2_cipher(k), iv, value),
        DesfireKey::TripleDes(k) => decrypt_with(tdes2_cipher(k), iv, value),
        DesfireKey::ThreeK3Des(k) => decrypt_with(TdesEde3::new(GenericArray::from_slice(k)), iv, value),
        DesfireKey::Aes(k) => decrypt_with(Aes128::new(GenericArray::from_slice(k)), iv, value),
    }
}

/// Cipher state of one authentication handshake.
///
/// Legacy keys reset the IV for every message and use send mode in the reader
/// to card direction. ISO and AES keys chain the IV across all messages of the
/// handshake.
pub struct ChainedCipher<'a> {
    key: &'a DesfireKey,
    iv: Vec<u8>,
    card_side: bool,
}

impl<'a> ChainedCipher<'a> {
    pub fn reader(key: &'a DesfireKey) -> Self {
        ChainedCipher {
            key,
            iv: vec![0; key.block_size()],
            card_side: false,
        }
    }

    pub fn card(key: &'a DesfireKey) -> Self {
        ChainedCipher {
            card_side: true,
            ..Self::reader(key)
        }
    }

    pub fn encipher(&mut self, value: &[u8]) -> NfcResult<Vec<u8>> {
        if self.key.is_legacy() {
            return if self.card_side {
                legacy_card_send(self.key.as_bytes(), value)
            } else {
                legacy_send(self.key.as_bytes(), value)
            };
        }

        let encrypted = cbc_encrypt(self.key, &self.iv, value)?;
        self.iv = last_block(&encrypted, self.key.block_size());
        Ok(encrypted)
    }

    pub fn decipher(&mut self, value: &[u8]) -> NfcResult<Vec<u8>> {
        if self.key.is_legacy() {
            return if self.card_side {
                legacy_card_receive(self.key.as_bytes(), value)
            } else {
                legacy_receive(self.key.as_bytes(), value)
            };
        }

        let decrypted = cbc_decrypt(self.key, &self.iv, value)?;
        self.iv = last_block(value, self.key.block_size());
        Ok(decrypted)
    }
}

/// Last cipher block of a message, which seeds the IV of the next one
pub fn last_block(value: &[u8], block_size: usize) -> Vec<u8> {
    value[value.len().saturating_sub(block_size)..].to_vec()
}

/// Rotate by one byte to the left, as both sides do with RndA and RndB
pub fn rotate_left(value: &[u8]) -> Vec<u8> {
    let mut rotated = value.to_vec();
    if !rotated.is_empty() {
        rotated.rotate_left(1);
    }
    rotated
}

pub fn generate_challenge(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}
