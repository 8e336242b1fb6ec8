//! Settings registry
//!
//! The registry holds one [`Setting`] per catalog row for the active model.
//! It is built once per session and lives as long as the session: settings
//! are never added or removed, only their current value changes.
//!
//! Values reach the registry in two ways:
//! - a full configuration dump from the device, see
//!   [`SettingsRegistry::apply_dump`], which is the only source of truth;
//! - a validated update request, which is recorded as `pending` until the
//!   next dump shows what the device actually holds.

use serde::Serialize;

pub mod definitions;
pub mod resolver;
pub mod values;

pub use definitions::{definitions, SettingDefinition, StorageOffsets};
pub use resolver::{ResolverId, SpeedUnit, ValueSource};
pub use values::{Value, ValueSet};

use crate::error::SettingError;
use crate::model::Model;

/// A catalog row together with its live value
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    definition: SettingDefinition,
    offset: Option<usize>,
    current: u8,
    pending: Option<u8>,
}

impl Setting {
    fn new(definition: SettingDefinition, model: Model) -> Self {
        Setting {
            offset: definition.offsets.get(model),
            definition,
            current: 0,
            pending: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Storage offset for the registry's model
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Last value id reported by the device
    pub fn current(&self) -> u8 {
        self.current
    }

    /// Value id sent to the device but not yet seen in a dump
    pub fn pending(&self) -> Option<u8> {
        self.pending
    }

    pub fn definition(&self) -> &SettingDefinition {
        &self.definition
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.definition.values, ValueSource::Dynamic(_))
    }
}

/// One entry of a settings-changed notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingChange {
    pub name: String,
    pub offset: usize,
    pub previous: u8,
    pub current: u8,
}

/// Serializable view of a setting, as handed out to collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingSnapshot {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    pub value: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<u8>,
    pub values: ValueSet,
}

/// Ordered settings of one session, bound to the session's model
#[derive(Debug, Clone)]
pub struct SettingsRegistry {
    model: Model,
    settings: Vec<Setting>,
}

impl SettingsRegistry {
    /// Build the registry for `model` from the built-in catalog
    pub fn new(model: Model) -> Self {
        let registry = Self::build(model, definitions());
        debug_assert!(registry.check_resolvers().is_ok());
        registry
    }

    /// Build a registry from arbitrary catalog rows.
    ///
    /// Fails when a dynamic resolver depends on a setting that is absent or is
    /// itself dynamic: resolution must never recurse.
    pub fn from_definitions(
        model: Model,
        definitions: Vec<SettingDefinition>,
    ) -> Result<Self, SettingError> {
        let registry = Self::build(model, definitions);
        registry.check_resolvers()?;
        Ok(registry)
    }

    fn build(model: Model, definitions: Vec<SettingDefinition>) -> Self {
        SettingsRegistry {
            model,
            settings: definitions
                .into_iter()
                .map(|d| Setting::new(d, model))
                .collect(),
        }
    }

    fn check_resolvers(&self) -> Result<(), SettingError> {
        for setting in &self.settings {
            if let ValueSource::Dynamic(resolver) = &setting.definition.values {
                let dependency = resolver.dependency();
                match self.lookup_by_name(dependency) {
                    Some(dep) if !dep.is_dynamic() => {}
                    _ => {
                        return Err(SettingError::ResolverDependency {
                            setting: setting.name().to_string(),
                            dependency: dependency.to_string(),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.settings.iter()
    }

    fn position_by_name(&self, name: &str) -> Option<usize> {
        self.settings
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name))
    }

    fn position_by_offset(&self, offset: usize) -> Option<usize> {
        self.settings.iter().position(|s| s.offset == Some(offset))
    }

    /// First setting whose name matches, ignoring case
    pub fn lookup_by_name(&self, name: &str) -> Option<&Setting> {
        self.position_by_name(name).map(|i| &self.settings[i])
    }

    /// First setting stored at `offset` on the active model
    pub fn lookup_by_offset(&self, offset: usize) -> Option<&Setting> {
        self.position_by_offset(offset).map(|i| &self.settings[i])
    }

    /// Value set as it stands right now; dynamic sets are recomputed on each call
    pub fn current_value_set(&self, setting: &Setting) -> ValueSet {
        match &setting.definition.values {
            ValueSource::Static(values) => values.clone(),
            ValueSource::Dynamic(resolver) => resolver.resolve(self),
        }
    }

    /// Whether `id` is a member of the setting's current value set
    pub fn validate(&self, setting: &Setting, id: u8) -> bool {
        match &setting.definition.values {
            ValueSource::Static(values) => values.iter().any(|v| v.id == id),
            ValueSource::Dynamic(resolver) => resolver.resolve(self).iter().any(|v| v.id == id),
        }
    }

    /// The value the setting currently holds, if its id is in the current set
    pub fn current_value(&self, setting: &Setting) -> Option<Value> {
        self.current_value_set(setting)
            .into_iter()
            .find(|v| v.id == setting.current)
    }

    /// Current value name of a static setting, without invoking any resolver
    pub(crate) fn static_value_name(&self, name: &str) -> Option<&str> {
        let setting = self.lookup_by_name(name)?;
        match &setting.definition.values {
            ValueSource::Static(values) => values
                .iter()
                .find(|v| v.id == setting.current)
                .map(|v| v.name.as_str()),
            ValueSource::Dynamic(_) => None,
        }
    }

    /// Id of the value called `value_name` (case-insensitive) in the setting's current set
    pub fn value_id(&self, name: &str, value_name: &str) -> Result<u8, SettingError> {
        let setting = self
            .lookup_by_name(name)
            .ok_or_else(|| SettingError::NotFound(name.to_string()))?;

        self.current_value_set(setting)
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(value_name))
            .map(|v| v.id)
            .ok_or_else(|| SettingError::UnknownValueName {
                setting: setting.name().to_string(),
                value: value_name.to_string(),
            })
    }

    /// Resolve, validate and locate an update; returns the storage offset
    pub fn check_update(&self, name: &str, id: u8) -> Result<usize, SettingError> {
        let setting = self
            .lookup_by_name(name)
            .ok_or_else(|| SettingError::NotFound(name.to_string()))?;

        if !self.validate(setting, id) {
            return Err(SettingError::InvalidValue {
                setting: setting.name().to_string(),
                value: id,
            });
        }

        setting.offset.ok_or_else(|| SettingError::NoStorageOffset {
            setting: setting.name().to_string(),
            model: self.model,
        })
    }

    /// Remember an update that was sent but not yet confirmed
    pub fn mark_pending(&mut self, name: &str, id: u8) {
        if let Some(i) = self.position_by_name(name) {
            self.settings[i].pending = Some(id);
        }
    }

    /// Apply a full configuration memory dump.
    ///
    /// Every byte whose index is the storage offset of a setting (first match
    /// for the active model) is compared with that setting's value; bytes at
    /// unknown offsets are skipped. Returns the settings that changed, in dump
    /// order. Applying the same dump twice returns nothing the second time.
    pub fn apply_dump(&mut self, dump: &[u8]) -> Vec<SettingChange> {
        let mut changes = Vec::new();

        for (offset, &byte) in dump.iter().enumerate() {
            let Some(i) = self.position_by_offset(offset) else {
                continue;
            };
            let setting = &mut self.settings[i];
            setting.pending = None;

            if setting.current != byte {
                changes.push(SettingChange {
                    name: setting.name().to_string(),
                    offset,
                    previous: setting.current,
                    current: byte,
                });
                setting.current = byte;
            }
        }

        changes
    }

    /// Names of settings whose current id is outside their current value set
    pub fn out_of_range(&self) -> Vec<&str> {
        self.settings
            .iter()
            .filter(|s| s.offset.is_some() && !self.validate(s, s.current))
            .map(|s| s.name())
            .collect()
    }

    /// Out-of-range settings touched by a dump: the changed settings and the
    /// dynamic settings whose value set depends on one of them
    pub fn out_of_range_after(&self, changes: &[SettingChange]) -> Vec<String> {
        let changed = |name: &str| changes.iter().any(|c| c.name.eq_ignore_ascii_case(name));
        let mut names: Vec<String> = Vec::new();

        for (i, setting) in self.settings.iter().enumerate() {
            let Some(offset) = setting.offset else {
                continue;
            };
            if self.position_by_offset(offset) != Some(i)
                || self.validate(setting, setting.current)
            {
                continue;
            }
            let depends_on_change = match &setting.definition.values {
                ValueSource::Dynamic(resolver) => changed(resolver.dependency()),
                ValueSource::Static(_) => false,
            };
            if !changed(setting.name()) && !depends_on_change {
                continue;
            }
            if !names.iter().any(|n| n == setting.name()) {
                names.push(setting.name().to_string());
            }
        }
        names
    }

    pub fn snapshot(&self) -> Vec<SettingSnapshot> {
        self.settings
            .iter()
            .map(|s| SettingSnapshot {
                name: s.name().to_string(),
                offset: s.offset,
                value: s.current,
                value_name: self.current_value(s).map(|v| v.name),
                pending: s.pending,
                values: self.current_value_set(s),
            })
            .collect()
    }

    /// The snapshot as a JSON array
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}
