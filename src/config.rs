use crate::codec::{DecodeMode, MacAddr};
use crate::error::{Result, SadpError};
use crate::identity::{NetworkIdentity, SCOPE_GLOBAL};
use crate::transport::RECEIVE_BUFFER_SIZE;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

/// Interface the engine sends from and captures on.
#[derive(Debug, Deserialize, Clone)]
pub struct InterfaceConfig {
    pub name: String,
    /// Kernel interface index; 0 resolves it from `name` when binding.
    #[serde(default)]
    pub index: u32,
    pub mac: String,
    pub ipv4: Ipv4Addr,
    #[serde(default = "default_ipv6")]
    pub ipv6: Ipv6Addr,
    #[serde(default = "default_scope")]
    pub scope: u32,
}

impl InterfaceConfig {
    pub fn identity(&self) -> Result<NetworkIdentity> {
        let mac: MacAddr = self.mac.parse()?;
        Ok(NetworkIdentity::new(self.index, self.name.clone(), mac, self.ipv4, self.ipv6).with_scope(self.scope))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SadpConfig {
    pub interface: InterfaceConfig,
    /// First frame counter value; random when absent.
    #[serde(default)]
    pub counter_start: Option<u32>,
    /// Receive buffer in bytes (default and minimum: 8192)
    #[serde(default = "default_receive_buffer_size")]
    pub receive_buffer_size: usize,
    /// Reject frames with a wrong prefix or checksum (default: false)
    #[serde(default)]
    pub strict_decode: bool,
}

fn default_ipv6() -> Ipv6Addr { Ipv6Addr::UNSPECIFIED }
fn default_scope() -> u32 { SCOPE_GLOBAL }
fn default_receive_buffer_size() -> usize { RECEIVE_BUFFER_SIZE }

impl SadpConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let config: SadpConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: SadpConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interface.name.is_empty() && self.interface.index == 0 {
            return Err(SadpError::Config("interface needs a name or an index".into()));
        }
        if self.receive_buffer_size < RECEIVE_BUFFER_SIZE {
            return Err(SadpError::Config(format!(
                "receive_buffer_size {} is below the minimum of {}",
                self.receive_buffer_size, RECEIVE_BUFFER_SIZE
            )));
        }
        self.interface.mac.parse::<MacAddr>()?;
        Ok(())
    }

    pub fn identity(&self) -> Result<NetworkIdentity> {
        self.interface.identity()
    }

    pub fn decode_mode(&self) -> DecodeMode {
        if self.strict_decode {
            DecodeMode::Strict
        } else {
            DecodeMode::Lenient
        }
    }
}
