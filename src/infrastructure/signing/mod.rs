//! Signer capability: one `sign(message)` contract over local key material
//! and out-of-process hardware signing.

use crate::foundation::{Address, EngineError, Result, Signature};
use async_trait::async_trait;
use ed25519_dalek::{Signer as DalekSigner, SigningKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use zeroize::Zeroize;

#[async_trait]
pub trait Signer: Send + Sync {
    fn public_key(&self) -> Address;
    async fn sign(&self, message: &[u8]) -> Result<Signature>;
}

/// Owns secret material in-process; signs immediately.
pub struct LocalSigner {
    key: SigningKey,
    public: Address,
}

impl LocalSigner {
    pub fn from_secret_bytes(mut seed: [u8; 32]) -> Self {
        let key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        let public = Address::new(key.verifying_key().to_bytes());
        Self { key, public }
    }

    pub fn generate() -> Self {
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let public = Address::new(key.verifying_key().to_bytes());
        Self { key, public }
    }
}

#[async_trait]
impl Signer for LocalSigner {
    fn public_key(&self) -> Address {
        self.public
    }

    async fn sign(&self, message: &[u8]) -> Result<Signature> {
        Ok(Signature::new(self.key.sign(message).to_bytes()))
    }
}

/// Out-of-process round trip producing a detached signature for a known
/// public key. Transport details (device discovery, user confirmation) live
/// behind the channel.
#[async_trait]
pub trait HardwareChannel: Send + Sync {
    async fn sign_digest(&self, public_key: &Address, message: &[u8]) -> Result<Signature>;
}

pub struct RemoteHardwareSigner {
    public: Address,
    channel: Arc<dyn HardwareChannel>,
}

impl RemoteHardwareSigner {
    pub fn new(public: Address, channel: Arc<dyn HardwareChannel>) -> Self {
        Self { public, channel }
    }
}

#[async_trait]
impl Signer for RemoteHardwareSigner {
    fn public_key(&self) -> Address {
        self.public
    }

    async fn sign(&self, message: &[u8]) -> Result<Signature> {
        self.channel
            .sign_digest(&self.public, message)
            .await
            .map_err(|err| EngineError::signing(self.public.to_string(), err.to_string()))
    }
}

/// Resolves logical signer names. Resolution is pure lookup: callable (and
/// failing) before any network I/O.
#[derive(Clone, Default)]
pub struct SignerRegistry {
    signers: BTreeMap<String, Arc<dyn Signer>>,
}

impl SignerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, signer: Arc<dyn Signer>) {
        self.signers.insert(name.into(), signer);
    }

    pub fn with(mut self, name: impl Into<String>, signer: Arc<dyn Signer>) -> Self {
        self.insert(name, signer);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Signer>> {
        self.signers.get(name).cloned().ok_or_else(|| EngineError::unknown_signer(name))
    }

    pub fn public_key(&self, name: &str) -> Result<Address> {
        Ok(self.resolve(name)?.public_key())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.signers.keys().map(String::as_str)
    }
}
