use std::cell::RefCell;
use std::collections::HashMap;

use rbridge_api::oid::TypeOid;
use rbridge_api::types::{TypeCatalog, TypeInfo};

use crate::config::ConversionSettings;
use crate::error::ConversionError;
use crate::region::CallRegions;

/// Memoized catalog lookups, scoped to one conversion context.
///
/// Entries are filled on first use and never mutated afterwards.
pub struct TypeCache<'c> {
    catalog: &'c dyn TypeCatalog,
    entries: RefCell<HashMap<TypeOid, TypeInfo>>,
}

impl<'c> TypeCache<'c> {
    pub fn new(catalog: &'c dyn TypeCatalog) -> Self {
        Self {
            catalog,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn lookup(&self, oid: TypeOid) -> Result<TypeInfo, ConversionError> {
        if let Some(info) = self.entries.borrow().get(&oid) {
            return Ok(info.clone());
        }
        let info = self.catalog.lookup(oid).map_err(ConversionError::Catalog)?;
        tracing::trace!(oid, name = %info.name, class = %info.class, "cached type");
        self.entries.borrow_mut().insert(oid, info.clone());
        Ok(info)
    }

    /// Element type of the array type `oid`.
    pub fn element_of(&self, oid: TypeOid) -> Result<TypeInfo, ConversionError> {
        let info = self.lookup(oid)?;
        match info.element_type() {
            Some(elem) => self.lookup(elem),
            None => Err(ConversionError::BadInternalRepresentation(format!(
                "type {} is not an array type",
                info.name
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Declared shape of the call's result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallShape {
    pub returns_set: bool,
    pub returns_tuple: bool,
}

impl CallShape {
    pub fn scalar() -> Self {
        Self::default()
    }

    pub fn set_of_scalars() -> Self {
        Self { returns_set: true, returns_tuple: false }
    }

    pub fn tuple() -> Self {
        Self { returns_set: false, returns_tuple: true }
    }

    pub fn set_of_tuples() -> Self {
        Self { returns_set: true, returns_tuple: true }
    }

    pub fn produces_rows(&self) -> bool {
        self.returns_set || self.returns_tuple
    }
}

/// The call's result type, with its element type for array results.
#[derive(Debug, Clone)]
pub struct ResultBinding {
    pub result: TypeInfo,
    pub element: Option<TypeInfo>,
}

/// Everything one call's conversions need. Owned by that call.
pub struct ConversionContext<'c> {
    types: TypeCache<'c>,
    regions: &'c CallRegions,
    settings: ConversionSettings,
    shape: CallShape,
    result: Option<ResultBinding>,
}

impl<'c> ConversionContext<'c> {
    pub fn new(catalog: &'c dyn TypeCatalog, regions: &'c CallRegions) -> Self {
        Self {
            types: TypeCache::new(catalog),
            regions,
            settings: ConversionSettings::default(),
            shape: CallShape::default(),
            result: None,
        }
    }

    pub fn with_settings(mut self, settings: ConversionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_call_shape(mut self, shape: CallShape) -> Self {
        self.shape = shape;
        self
    }

    /// Bind the result type. Array result types also bind their element type.
    pub fn bind_result(mut self, oid: TypeOid) -> Result<Self, ConversionError> {
        let result = self.types.lookup(oid).map_err(|e| e.with_context("result type"))?;
        let element = result
            .is_array()
            .then(|| self.types.element_of(oid))
            .transpose()
            .map_err(|e| e.with_context("result element type"))?;
        tracing::debug!(
            result = %result.name,
            element = element.as_ref().map(|e| e.name.as_str()),
            "bound result type"
        );
        self.result = Some(ResultBinding { result, element });
        Ok(self)
    }

    pub fn types(&self) -> &TypeCache<'c> {
        &self.types
    }

    pub fn regions(&self) -> &'c CallRegions {
        self.regions
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    pub fn call_shape(&self) -> CallShape {
        self.shape
    }

    pub fn result(&self) -> Option<&ResultBinding> {
        self.result.as_ref()
    }

    pub(crate) fn result_binding(&self) -> Result<&ResultBinding, ConversionError> {
        self.result
            .as_ref()
            .ok_or_else(|| ConversionError::Config("no result type bound to the conversion context".into()))
    }
}
