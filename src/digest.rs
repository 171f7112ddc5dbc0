//! SHA-256 primitives used by the Three-Lock aggregator.
//!
//! Both backends must produce the same digest for the same bytes; a report
//! hashed with one is comparable with a report hashed with the other.

use async_trait::async_trait;
use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::SubtleCrypto;

use crate::config::HashBackend;
use crate::error::{Result, ScanError};

/// A source of SHA-256 digests.
#[async_trait(?Send)]
pub trait HashPrimitive {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn sha256(&self, data: &[u8]) -> Result<[u8; 32]>;

    /// Digest as lowercase hex.
    async fn sha256_hex(&self, data: &[u8]) -> Result<String> {
        Ok(hex::encode(self.sha256(data).await?))
    }
}

/// Pure-Rust digest via `sha2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSha256;

#[async_trait(?Send)]
impl HashPrimitive for NativeSha256 {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn sha256(&self, data: &[u8]) -> Result<[u8; 32]> {
        Ok(crate::canonical::sha256_bytes(data))
    }
}

/// `crypto.subtle.digest("SHA-256", ...)` of the current global scope.
pub struct WebCryptoSha256 {
    subtle: SubtleCrypto,
}

impl WebCryptoSha256 {
    /// Look up `crypto.subtle` on the global object.
    ///
    /// `subtle` is `undefined` outside secure contexts, which surfaces here
    /// as [`ScanError::HashUnavailable`].
    pub fn from_global() -> Result<Self> {
        let global = js_sys::global();
        let crypto = Reflect::get(&global, &JsValue::from_str("crypto"))
            .map_err(|e| ScanError::HashUnavailable(format!("crypto lookup threw: {:?}", e)))?;
        if crypto.is_undefined() || crypto.is_null() {
            return Err(ScanError::HashUnavailable("crypto is undefined".into()));
        }
        let subtle = Reflect::get(&crypto, &JsValue::from_str("subtle"))
            .map_err(|e| ScanError::HashUnavailable(format!("crypto.subtle lookup threw: {:?}", e)))?;
        if subtle.is_undefined() || subtle.is_null() {
            return Err(ScanError::HashUnavailable(
                "crypto.subtle is undefined (insecure context?)".into(),
            ));
        }
        Ok(Self {
            subtle: subtle.unchecked_into::<SubtleCrypto>(),
        })
    }
}

#[async_trait(?Send)]
impl HashPrimitive for WebCryptoSha256 {
    fn name(&self) -> &'static str {
        "webcrypto"
    }

    async fn sha256(&self, data: &[u8]) -> Result<[u8; 32]> {
        let buffer = Uint8Array::from(data);
        let promise = self
            .subtle
            .digest_with_str_and_buffer_source("SHA-256", &buffer)
            .map_err(|e| ScanError::HashUnavailable(format!("digest threw: {:?}", e)))?;

        let result = JsFuture::from(promise)
            .await
            .map_err(|e| ScanError::Digest(format!("digest rejected: {:?}", e)))?;

        let bytes = Uint8Array::new(&result).to_vec();
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| ScanError::Digest(format!("digest returned {} bytes", v.len())))
    }
}

/// Build the configured backend.
pub fn hasher_for(backend: HashBackend) -> Result<Box<dyn HashPrimitive>> {
    match backend {
        HashBackend::Native => Ok(Box::new(NativeSha256)),
        HashBackend::WebCrypto => Ok(Box::new(WebCryptoSha256::from_global()?)),
    }
}
