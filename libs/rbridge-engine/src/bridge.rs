//! Entry points used by the call handler: arguments in, result out.

use rbridge_api::relational::{Datum, RelationalValue};
use rbridge_api::runtime::RuntimeValue;

use crate::array::array_to_runtime;
use crate::catalog::BuiltinCatalog;
use crate::config::{BridgeConfig, ConversionSettings};
use crate::context::ConversionContext;
use crate::error::ConversionError;
use crate::materialize::{CallOutput, ResultSetInfo, materialize};
use crate::region::CallRegions;
use crate::scalar::pg_scalar_to_runtime;
use crate::tabular::rows_to_frame;

/// Built-in catalog plus conversion settings, shared by every call.
#[derive(Debug, Default)]
pub struct Bridge {
    catalog: BuiltinCatalog,
    settings: ConversionSettings,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self, ConversionError> {
        let mut catalog = BuiltinCatalog::new();
        for alias in &config.types {
            catalog
                .register_alias(alias.oid, &alias.name, &alias.like, alias.array_oid)
                .map_err(|e| ConversionError::Config(e.to_string()))?;
            tracing::info!(oid = alias.oid, name = %alias.name, like = %alias.like, "registered type alias");
        }
        Ok(Self {
            catalog,
            settings: config.conversion.clone(),
        })
    }

    pub fn catalog(&self) -> &BuiltinCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    /// A fresh context for one call.
    pub fn context<'a>(&'a self, regions: &'a CallRegions) -> ConversionContext<'a> {
        ConversionContext::new(&self.catalog, regions).with_settings(self.settings.clone())
    }
}

/// Convert every call argument to its runtime form, in order.
pub fn convert_arguments(
    args: &[RelationalValue],
    ctx: &ConversionContext<'_>,
) -> Result<Vec<RuntimeValue>, ConversionError> {
    let converted = args
        .iter()
        .enumerate()
        .map(|(i, arg)| convert_argument(arg, ctx).map_err(|e| e.with_context(format!("argument {}", i + 1))))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(args = converted.len(), "arguments converted");
    Ok(converted)
}

fn convert_argument(arg: &RelationalValue, ctx: &ConversionContext<'_>) -> Result<RuntimeValue, ConversionError> {
    let types = ctx.types();
    match arg {
        RelationalValue::Scalar { type_oid, value } => {
            let info = types.lookup(*type_oid)?;
            match value {
                Some(Datum::Array(array)) if info.is_array() => Ok(array_to_runtime(array, types)?.into()),
                _ => Ok(pg_scalar_to_runtime(value.as_ref(), &info)?.into()),
            }
        }
        RelationalValue::Array { type_oid, value } => {
            let info = types.lookup(*type_oid)?;
            if !info.is_array() {
                return Err(ConversionError::BadInternalRepresentation(format!(
                    "type {} is not an array type",
                    info.name
                )));
            }
            Ok(array_to_runtime(value, types)?.into())
        }
        RelationalValue::RowSet(rows) => rows_to_frame(&rows.columns, &rows.rows, types),
    }
}

/// Convert the runtime result of a call. The value is consumed.
pub fn convert_result(
    value: RuntimeValue,
    ctx: &ConversionContext<'_>,
    rsinfo: Option<&ResultSetInfo>,
) -> Result<CallOutput, ConversionError> {
    materialize(value, ctx, rsinfo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeAliasConfig;
    use rbridge_api::oid::*;
    use rbridge_api::relational::{ArrayValue, Row, RowSet};
    use rbridge_api::runtime::{RuntimeScalar, Vector};
    use rbridge_api::schema::ColumnDescriptor;

    #[test]
    fn arguments_convert_in_order() {
        let bridge = Bridge::new();
        let regions = CallRegions::new();
        let ctx = bridge.context(&regions);
        let args = vec![
            RelationalValue::Scalar { type_oid: INT4OID, value: Some(Datum::Int4(5)) },
            RelationalValue::null(TEXTOID),
            RelationalValue::Array {
                type_oid: FLOAT8ARRAYOID,
                value: ArrayValue::from_elements(FLOAT8OID, vec![Datum::Float8(0.5)]),
            },
            RelationalValue::RowSet(RowSet {
                columns: vec![ColumnDescriptor::scalar("b", BOOLOID)],
                rows: vec![Row(vec![Some(Datum::Bool(true))])],
            }),
        ];
        let converted = convert_arguments(&args, &ctx).unwrap();
        assert_eq!(converted[0], Vector::integer(vec![Some(5)]).into());
        assert_eq!(converted[1], Vector::missing().into());
        assert_eq!(converted[2], Vector::real(vec![Some(0.5)]).into());
        let frame = converted[3].as_frame().unwrap();
        assert_eq!(frame.column(0).and_then(|c| c.scalar_at(0)), Some(RuntimeScalar::Logical(true)));
    }

    #[test]
    fn array_datum_in_scalar_slot() {
        let bridge = Bridge::new();
        let regions = CallRegions::new();
        let ctx = bridge.context(&regions);
        let array = ArrayValue::new(INT4OID, vec![1, 2], vec![Datum::Int4(1), Datum::Int4(2)]).unwrap();
        let args = vec![RelationalValue::Scalar { type_oid: INT4ARRAYOID, value: Some(Datum::Array(array)) }];
        let converted = convert_arguments(&args, &ctx).unwrap();
        assert_eq!(converted[0].as_vector().and_then(|v| v.dim()), Some(&[1, 2][..]));
    }

    #[test]
    fn failing_argument_is_named() {
        let bridge = Bridge::new();
        let regions = CallRegions::new();
        let ctx = bridge.context(&regions);
        let args = vec![
            RelationalValue::null(INT4OID),
            RelationalValue::Array { type_oid: INT4OID, value: ArrayValue::empty(INT4OID) },
        ];
        let err = convert_arguments(&args, &ctx).unwrap_err();
        assert!(err.to_string().contains("argument 2"), "{err}");
    }

    #[test]
    fn aliases_from_config() {
        let config = BridgeConfig {
            types: vec![TypeAliasConfig {
                oid: 20_000,
                name: "celsius".into(),
                like: "float8".into(),
                array_oid: Some(20_001),
            }],
            ..BridgeConfig::default()
        };
        let bridge = Bridge::from_config(&config).unwrap();
        let regions = CallRegions::new();
        let ctx = bridge.context(&regions).bind_result(20_001).unwrap();
        let out = convert_result(Vector::integer(vec![Some(21)]).into(), &ctx, None).unwrap();
        let CallOutput::Value(RelationalValue::Array { value, .. }) = out else {
            panic!("expected an array value");
        };
        assert_eq!(value.elem_type(), 20_000);
        assert_eq!(value.elements(), &[Datum::Float8(21.0)]);
    }

    #[test]
    fn reserved_alias_oid_is_config_error() {
        let config = BridgeConfig {
            types: vec![TypeAliasConfig { oid: 23, name: "dup".into(), like: "int4".into(), array_oid: None }],
            ..BridgeConfig::default()
        };
        assert!(matches!(Bridge::from_config(&config), Err(ConversionError::Config(_))));
    }
}
