// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TOML provisioning schema for a device's com-object table, gated behind
//! the `config` feature. This is strictly a host-side convenience: nothing
//! in [`crate::link`] or [`crate::device`] depends on `serde` or `toml`.

use serde::{Deserialize, Serialize};

use crate::address::{group_address, physical_address};
use crate::comobject::{ComObject, Indicator};
use crate::dpt::{DptId, DptTable};
use crate::index::MAX_COM_OBJECTS;

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PhysicalAddressConfig {
    pub area: u8,
    pub line: u8,
    pub device: u8,
}

impl PhysicalAddressConfig {
    pub fn encode(&self) -> u16 {
        physical_address(self.area, self.line, self.device)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct GroupAddressConfig {
    pub main: u8,
    pub middle: u8,
    pub sub: u8,
}

impl GroupAddressConfig {
    pub fn encode(&self) -> u16 {
        group_address(self.main, self.middle, self.sub)
    }
}

/// One `[[com_objects]]` table entry. Indicator bits are spelled out as
/// named booleans rather than a raw mask, since that's what a human is
/// going to edit in a TOML file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComObjectConfig {
    pub address: GroupAddressConfig,
    pub dpt_main: u16,
    pub dpt_sub: u16,
    #[serde(default)]
    pub communication: bool,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub transmit: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub init_read: bool,
}

impl ComObjectConfig {
    fn indicator(&self) -> Indicator {
        let mut flags = Indicator::empty();
        if self.communication {
            flags |= Indicator::COMMUNICATION;
        }
        if self.read {
            flags |= Indicator::READ;
        }
        if self.write {
            flags |= Indicator::WRITE;
        }
        if self.transmit {
            flags |= Indicator::TRANSMIT;
        }
        if self.update {
            flags |= Indicator::UPDATE;
        }
        if self.init_read {
            flags |= Indicator::INIT_READ;
        }
        flags
    }
}

/// A full device provisioning document: one `[physical_address]` table and
/// zero or more `[[com_objects]]` entries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub physical_address: PhysicalAddressConfig,
    #[serde(default)]
    pub com_objects: Vec<ComObjectConfig>,
}

/// Errors building com-objects out of a parsed [`DeviceConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Toml(toml::de::Error),
    /// `com_objects[index]` names a DPT the supplied table doesn't know.
    UnknownDpt { index: usize, dpt: DptId },
    /// `com_objects[index]`'s resolved length falls outside `1..=15`, or
    /// the device has more com-objects than [`MAX_COM_OBJECTS`] allows.
    InvalidComObject { index: usize },
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::Toml(e) => write!(f, "invalid TOML: {e}"),
            ConfigError::UnknownDpt { index, dpt } => {
                write!(f, "com_objects[{index}]: unknown DPT {}.{}", dpt.main, dpt.sub)
            }
            ConfigError::InvalidComObject { index } => {
                write!(f, "com_objects[{index}]: could not be built (bad length or table full)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl DeviceConfig {
    /// Parses a TOML document into a [`DeviceConfig`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::Toml)
    }

    /// Resolves this document's `[[com_objects]]` entries into
    /// [`ComObject`]s, sized using `table`.
    pub fn build_com_objects(&self, table: &dyn DptTable) -> Result<heapless::Vec<ComObject, MAX_COM_OBJECTS>, ConfigError> {
        let mut objects = heapless::Vec::new();
        for (index, entry) in self.com_objects.iter().enumerate() {
            let dpt = DptId::new(entry.dpt_main, entry.dpt_sub);
            if table.bit_length(dpt).is_none() {
                return Err(ConfigError::UnknownDpt { index, dpt });
            }
            let obj = ComObject::new(entry.address.encode(), dpt, entry.indicator(), table)
                .ok_or(ConfigError::InvalidComObject { index })?;
            objects.push(obj).map_err(|_| ConfigError::InvalidComObject { index })?;
        }
        Ok(objects)
    }
}
