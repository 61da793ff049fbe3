//! Built-in type catalog.
//!
//! Implements the host's well-known scalar types and their array types with
//! text input/output functions. Hosts with a real catalog implement
//! [`TypeCatalog`] themselves; this one serves the CLI and tests.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

use rbridge_api::error::HostError;
use rbridge_api::oid::*;
use rbridge_api::relational::{ArrayValue, Datum};
use rbridge_api::types::{
    TypeAlign, TypeCatalog, TypeClass, TypeInfo, TypeInput, TypeLayout, TypeOutput,
};

const NAMEDATALEN: usize = 64;

// ═══════════════════════════════════════════════════════════════
//  BuiltinCatalog
// ═══════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct BuiltinCatalog {
    types: HashMap<TypeOid, TypeInfo>,
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        let mut catalog = Self { types: HashMap::new() };

        let byval = |len, align| TypeLayout::fixed(len, true, align);
        catalog.add_scalar(BOOLOID, "bool", byval(1, TypeAlign::Char), BOOLARRAYOID, BoolIo);
        catalog.add_scalar(INT2OID, "int2", byval(2, TypeAlign::Short), INT2ARRAYOID, IntIo::INT2);
        catalog.add_scalar(INT4OID, "int4", byval(4, TypeAlign::Int), INT4ARRAYOID, IntIo::INT4);
        catalog.add_scalar(INT8OID, "int8", byval(8, TypeAlign::Double), INT8ARRAYOID, IntIo::INT8);
        catalog.add_scalar(FLOAT4OID, "float4", byval(4, TypeAlign::Int), FLOAT4ARRAYOID, FloatIo::FLOAT4);
        catalog.add_scalar(FLOAT8OID, "float8", byval(8, TypeAlign::Double), FLOAT8ARRAYOID, FloatIo::FLOAT8);
        catalog.add_scalar(CASHOID, "money", byval(8, TypeAlign::Double), CASHARRAYOID, MoneyIo);
        catalog.add_scalar(NUMERICOID, "numeric", TypeLayout::varlena(TypeAlign::Int), NUMERICARRAYOID, NumericIo);
        catalog.add_scalar(TEXTOID, "text", TypeLayout::varlena(TypeAlign::Int), TEXTARRAYOID, TextIo::TEXT);
        catalog.add_scalar(VARCHAROID, "varchar", TypeLayout::varlena(TypeAlign::Int), VARCHARARRAYOID, TextIo::TEXT);
        catalog.add_scalar(BPCHAROID, "bpchar", TypeLayout::varlena(TypeAlign::Int), BPCHARARRAYOID, TextIo::TEXT);
        catalog.add_scalar(
            NAMEOID,
            "name",
            TypeLayout::fixed(NAMEDATALEN as i16, false, TypeAlign::Char),
            NAMEARRAYOID,
            TextIo::NAME,
        );
        if let Some(name) = catalog.types.get_mut(&NAMEOID) {
            name.elem = Some(CHAROID);
        }

        let arrays = [
            (BOOLARRAYOID, "_bool", BOOLOID),
            (INT2ARRAYOID, "_int2", INT2OID),
            (INT4ARRAYOID, "_int4", INT4OID),
            (INT8ARRAYOID, "_int8", INT8OID),
            (FLOAT4ARRAYOID, "_float4", FLOAT4OID),
            (FLOAT8ARRAYOID, "_float8", FLOAT8OID),
            (CASHARRAYOID, "_money", CASHOID),
            (NUMERICARRAYOID, "_numeric", NUMERICOID),
            (TEXTARRAYOID, "_text", TEXTOID),
            (VARCHARARRAYOID, "_varchar", VARCHAROID),
            (BPCHARARRAYOID, "_bpchar", BPCHAROID),
            (NAMEARRAYOID, "_name", NAMEOID),
        ];
        for (oid, name, elem) in arrays {
            catalog.add_array(oid, name, elem);
        }

        catalog
    }

    fn add_scalar<T>(&mut self, oid: TypeOid, name: &str, layout: TypeLayout, array: TypeOid, io: T)
    where
        T: TypeInput + TypeOutput + 'static,
    {
        let io = Arc::new(io);
        self.types.insert(
            oid,
            TypeInfo {
                oid,
                name: name.to_string(),
                class: TypeClass::of(oid),
                layout,
                elem: None,
                array: Some(array),
                input: io.clone(),
                output: io,
            },
        );
    }

    fn add_array(&mut self, oid: TypeOid, name: &str, elem_oid: TypeOid) {
        let Some(elem) = self.types.get(&elem_oid) else {
            return;
        };
        let align = if elem.layout.align == TypeAlign::Double {
            TypeAlign::Double
        } else {
            TypeAlign::Int
        };
        let io = Arc::new(ArrayIo {
            elem_oid,
            input: elem.input.clone(),
            output: elem.output.clone(),
        });
        self.types.insert(
            oid,
            TypeInfo {
                oid,
                name: name.to_string(),
                class: TypeClass::Text,
                layout: TypeLayout::varlena(align),
                elem: Some(elem_oid),
                array: None,
                input: io.clone(),
                output: io,
            },
        );
    }

    /// Register `name` under `oid` as an alias of the scalar type named `like`.
    ///
    /// The alias shares the I/O functions, layout and classification of its
    /// base type. An array type is registered alongside at `array_oid` when given.
    pub fn register_alias(
        &mut self,
        oid: TypeOid,
        name: &str,
        like: &str,
        array_oid: Option<TypeOid>,
    ) -> Result<(), HostError> {
        if oid < FIRST_NORMAL_OID {
            return Err(HostError::unsupported(format!(
                "alias '{name}': oid {oid} is reserved for built-in types"
            )));
        }
        for taken in std::iter::once(oid).chain(array_oid) {
            if self.types.contains_key(&taken) {
                return Err(HostError::unsupported(format!(
                    "alias '{name}': oid {taken} is already registered"
                )));
            }
        }
        let base = self
            .lookup_by_name(like)
            .ok_or_else(|| HostError::unknown_type(format!("alias '{name}': no type named '{like}'")))?;
        if base.is_array() {
            return Err(HostError::unsupported(format!(
                "alias '{name}': base type '{like}' is an array type"
            )));
        }

        let mut info = base.clone();
        info.oid = oid;
        info.name = name.to_string();
        info.array = array_oid;
        let (elem_input, elem_output) = (info.input.clone(), info.output.clone());
        self.types.insert(oid, info);

        if let Some(array_oid) = array_oid {
            let io = Arc::new(ArrayIo { elem_oid: oid, input: elem_input, output: elem_output });
            self.types.insert(
                array_oid,
                TypeInfo {
                    oid: array_oid,
                    name: format!("_{name}"),
                    class: TypeClass::Text,
                    layout: TypeLayout::varlena(TypeAlign::Int),
                    elem: Some(oid),
                    array: None,
                    input: io.clone(),
                    output: io,
                },
            );
        }
        Ok(())
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&TypeInfo> {
        self.types.values().find(|t| t.name == name)
    }
}

impl TypeCatalog for BuiltinCatalog {
    fn lookup(&self, oid: TypeOid) -> Result<TypeInfo, HostError> {
        self.types
            .get(&oid)
            .cloned()
            .ok_or_else(|| HostError::unknown_type(format!("cache lookup failed for type {oid}")))
    }
}

fn invalid_syntax(type_name: &str, text: &str) -> HostError {
    HostError::invalid_input(format!("invalid input syntax for type {type_name}: \"{text}\""))
}

fn wrong_datum(type_name: &str, datum: &Datum) -> HostError {
    HostError::unsupported(format!("{type_name} output cannot render {datum:?}"))
}

// ═══════════════════════════════════════════════════════════════
//  Scalar I/O
// ═══════════════════════════════════════════════════════════════

struct BoolIo;

impl TypeInput for BoolIo {
    fn input(&self, text: &str, _typmod: i32) -> Result<Datum, HostError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" | "on" | "1" => Ok(Datum::Bool(true)),
            "f" | "false" | "n" | "no" | "off" | "0" => Ok(Datum::Bool(false)),
            _ => Err(invalid_syntax("boolean", text)),
        }
    }
}

impl TypeOutput for BoolIo {
    fn output(&self, datum: &Datum) -> Result<String, HostError> {
        match datum {
            Datum::Bool(b) => Ok(if *b { "t" } else { "f" }.to_string()),
            other => Err(wrong_datum("boolean", other)),
        }
    }
}

struct IntIo {
    name: &'static str,
    width: u8,
}

impl IntIo {
    const INT2: IntIo = IntIo { name: "smallint", width: 2 };
    const INT4: IntIo = IntIo { name: "integer", width: 4 };
    const INT8: IntIo = IntIo { name: "bigint", width: 8 };
}

impl TypeInput for IntIo {
    fn input(&self, text: &str, _typmod: i32) -> Result<Datum, HostError> {
        let trimmed = text.trim();
        let value: i64 = trimmed.parse().map_err(|e: std::num::ParseIntError| {
            use std::num::IntErrorKind;
            match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => out_of_range(self.name, text),
                _ => invalid_syntax(self.name, text),
            }
        })?;
        match self.width {
            2 => i16::try_from(value)
                .map(Datum::Int2)
                .map_err(|_| out_of_range(self.name, text)),
            4 => i32::try_from(value)
                .map(Datum::Int4)
                .map_err(|_| out_of_range(self.name, text)),
            _ => Ok(Datum::Int8(value)),
        }
    }
}

impl TypeOutput for IntIo {
    fn output(&self, datum: &Datum) -> Result<String, HostError> {
        match datum {
            Datum::Int2(v) => Ok(v.to_string()),
            Datum::Int4(v) => Ok(v.to_string()),
            Datum::Int8(v) => Ok(v.to_string()),
            other => Err(wrong_datum(self.name, other)),
        }
    }
}

fn out_of_range(type_name: &str, text: &str) -> HostError {
    HostError::invalid_input(format!("value \"{text}\" is out of range for type {type_name}"))
}

struct FloatIo {
    name: &'static str,
    single: bool,
}

impl FloatIo {
    const FLOAT4: FloatIo = FloatIo { name: "real", single: true };
    const FLOAT8: FloatIo = FloatIo { name: "double precision", single: false };
}

impl TypeInput for FloatIo {
    fn input(&self, text: &str, _typmod: i32) -> Result<Datum, HostError> {
        let value: f64 = text.trim().parse().map_err(|_| invalid_syntax(self.name, text))?;
        if self.single {
            let narrowed = value as f32;
            if narrowed.is_infinite() && value.is_finite() {
                return Err(out_of_range(self.name, text));
            }
            Ok(Datum::Float4(narrowed))
        } else {
            Ok(Datum::Float8(value))
        }
    }
}

impl TypeOutput for FloatIo {
    fn output(&self, datum: &Datum) -> Result<String, HostError> {
        match datum {
            Datum::Float4(v) => Ok(format_float(f64::from(*v), v.to_string())),
            Datum::Float8(v) => Ok(format_float(*v, v.to_string())),
            other => Err(wrong_datum(self.name, other)),
        }
    }
}

fn format_float(v: f64, finite: String) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        finite
    }
}

struct MoneyIo;

impl TypeInput for MoneyIo {
    fn input(&self, text: &str, _typmod: i32) -> Result<Datum, HostError> {
        let mut s = text.trim();
        let mut negative = false;
        if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            negative = true;
            s = inner.trim();
        }
        if let Some(rest) = s.strip_prefix('-') {
            negative = !negative;
            s = rest.trim_start();
        }
        let s = s.strip_prefix('$').unwrap_or(s);
        let digits: String = s.chars().filter(|c| *c != ',').collect();
        let (whole, frac) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
        if whole.is_empty() && frac.is_empty()
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid_syntax("money", text));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| out_of_range("money", text))?
        };
        let mut frac_digits = frac.bytes().map(|b| i64::from(b - b'0'));
        let tenths = frac_digits.next().unwrap_or(0);
        let hundredths = frac_digits.next().unwrap_or(0);
        let round_up = frac_digits.next().is_some_and(|d| d >= 5);

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(|| out_of_range("money", text))?;
        Ok(Datum::Money(if negative { -cents } else { cents }))
    }
}

impl TypeOutput for MoneyIo {
    fn output(&self, datum: &Datum) -> Result<String, HostError> {
        let Datum::Money(cents) = datum else {
            return Err(wrong_datum("money", datum));
        };
        let abs = cents.unsigned_abs();
        let whole = (abs / 100).to_string();
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        let sign = if *cents < 0 { "-" } else { "" };
        Ok(format!("{sign}${grouped}.{:02}", abs % 100))
    }
}

struct NumericIo;

impl TypeInput for NumericIo {
    fn input(&self, text: &str, _typmod: i32) -> Result<Datum, HostError> {
        let s = text.trim();
        if s.eq_ignore_ascii_case("nan") {
            return Ok(Datum::Numeric("NaN".to_string()));
        }
        if !is_decimal_literal(s) {
            return Err(invalid_syntax("numeric", text));
        }
        Ok(Datum::Numeric(s.strip_prefix('+').unwrap_or(s).to_string()))
    }
}

impl TypeOutput for NumericIo {
    fn output(&self, datum: &Datum) -> Result<String, HostError> {
        match datum {
            Datum::Numeric(s) => Ok(s.clone()),
            other => Err(wrong_datum("numeric", other)),
        }
    }
}

/// `[+-]digits[.digits][e[+-]digits]`, with at least one mantissa digit.
fn is_decimal_literal(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };
    let (whole, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits_ok = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() && frac.is_empty() || !digits_ok(whole) || !digits_ok(frac) {
        return false;
    }
    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && digits_ok(e)
        }
    }
}

struct TextIo {
    max_bytes: Option<usize>,
}

impl TextIo {
    const TEXT: TextIo = TextIo { max_bytes: None };
    const NAME: TextIo = TextIo { max_bytes: Some(NAMEDATALEN - 1) };
}

impl TypeInput for TextIo {
    fn input(&self, text: &str, _typmod: i32) -> Result<Datum, HostError> {
        let value = match self.max_bytes {
            Some(max) if text.len() > max => {
                let mut end = max;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                &text[..end]
            }
            _ => text,
        };
        Ok(Datum::Text(value.to_string()))
    }
}

impl TypeOutput for TextIo {
    fn output(&self, datum: &Datum) -> Result<String, HostError> {
        match datum {
            Datum::Text(s) => Ok(s.clone()),
            other => Err(wrong_datum("text", other)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Array I/O: `{1,2}`, `{{1,2},{3,4}}`
// ═══════════════════════════════════════════════════════════════

const ARRAY_DELIM: char = ',';
/// Deepest brace nesting an array literal may have.
const MAX_ARRAY_NESTING: usize = 6;

struct ArrayIo {
    elem_oid: TypeOid,
    input: Arc<dyn TypeInput>,
    output: Arc<dyn TypeOutput>,
}

impl TypeInput for ArrayIo {
    fn input(&self, text: &str, typmod: i32) -> Result<Datum, HostError> {
        let (dims, items) = parse_array_literal(text)?;
        let elements = items
            .iter()
            .map(|item| self.input.input(item, typmod))
            .collect::<Result<Vec<_>, _>>()?;
        let array = ArrayValue::new(self.elem_oid, dims, elements)
            .map_err(|e| e.with_context(format!("malformed array literal \"{text}\"")))?;
        Ok(Datum::Array(array))
    }
}

impl TypeOutput for ArrayIo {
    fn output(&self, datum: &Datum) -> Result<String, HostError> {
        let Datum::Array(array) = datum else {
            return Err(wrong_datum("array", datum));
        };
        if array.is_empty() {
            return Ok("{}".to_string());
        }
        let items = array
            .elements()
            .iter()
            .map(|e| self.output.output(e).map(|s| quote_array_item(&s)))
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = String::new();
        let mut iter = items.into_iter();
        write_array_level(&mut out, array.dims(), &mut iter);
        Ok(out)
    }
}

fn write_array_level(out: &mut String, dims: &[usize], items: &mut impl Iterator<Item = String>) {
    out.push('{');
    for i in 0..dims[0] {
        if i > 0 {
            out.push(ARRAY_DELIM);
        }
        if dims.len() > 1 {
            write_array_level(out, &dims[1..], items);
        } else if let Some(item) = items.next() {
            out.push_str(&item);
        }
    }
    out.push('}');
}

fn quote_array_item(s: &str) -> String {
    let needs_quotes = s.is_empty()
        || s.eq_ignore_ascii_case("NULL")
        || s.chars()
            .any(|c| matches!(c, '{' | '}' | '"' | '\\' | ARRAY_DELIM) || c.is_whitespace());
    if !needs_quotes {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Parse an array literal into extents and element texts in storage order.
pub(crate) fn parse_array_literal(text: &str) -> Result<(Vec<usize>, Vec<String>), HostError> {
    let mut parser = ArrayLiteralParser {
        text,
        chars: text.trim().chars().peekable(),
        dims: Vec::new(),
        items: Vec::new(),
    };
    parser.parse_level(0)?;
    parser.skip_ws();
    if parser.chars.peek().is_some() {
        return Err(parser.malformed("junk after closing right brace"));
    }
    if parser.items.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let dims = parser
        .dims
        .iter()
        .map(|d| d.ok_or_else(|| parser.malformed("inconsistent nesting")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((dims, parser.items))
}

struct ArrayLiteralParser<'a> {
    text: &'a str,
    chars: Peekable<Chars<'a>>,
    dims: Vec<Option<usize>>,
    items: Vec<String>,
}

impl ArrayLiteralParser<'_> {
    fn malformed(&self, detail: &str) -> HostError {
        HostError::invalid_input(format!("malformed array literal \"{}\": {detail}", self.text))
    }

    fn skip_ws(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn parse_level(&mut self, depth: usize) -> Result<(), HostError> {
        if depth >= MAX_ARRAY_NESTING {
            return Err(HostError::invalid_input(format!(
                "number of array dimensions exceeds the maximum allowed ({MAX_ARRAY_NESTING})"
            )));
        }
        self.skip_ws();
        match self.chars.next() {
            Some('{') => {}
            Some('[') => return Err(self.malformed("dimension decorations are not supported")),
            _ => return Err(self.malformed("array value must start with \"{\"")),
        }
        self.skip_ws();
        let mut count = 0;
        if self.chars.peek() == Some(&'}') {
            self.chars.next();
        } else {
            let mut nested: Option<bool> = None;
            loop {
                self.skip_ws();
                let is_nested = self.chars.peek() == Some(&'{');
                if nested.is_some_and(|n| n != is_nested) {
                    return Err(self.malformed("mixed sub-arrays and elements"));
                }
                nested = Some(is_nested);

                if is_nested {
                    self.parse_level(depth + 1)?;
                } else {
                    let item = self.parse_item()?;
                    self.items.push(item);
                }
                count += 1;

                self.skip_ws();
                match self.chars.next() {
                    Some(ARRAY_DELIM) => continue,
                    Some('}') => break,
                    Some(c) => return Err(self.malformed(&format!("unexpected \"{c}\""))),
                    None => return Err(self.malformed("unexpected end of input")),
                }
            }
        }

        if self.dims.len() <= depth {
            self.dims.resize(depth + 1, None);
        }
        match self.dims[depth] {
            None => self.dims[depth] = Some(count),
            Some(expected) if expected != count => {
                return Err(self.malformed("sub-arrays must have matching dimensions"));
            }
            Some(_) => {}
        }
        Ok(())
    }

    fn parse_item(&mut self) -> Result<String, HostError> {
        let mut item = String::new();
        if self.chars.peek() == Some(&'"') {
            self.chars.next();
            loop {
                match self.chars.next() {
                    Some('\\') => match self.chars.next() {
                        Some(c) => item.push(c),
                        None => return Err(self.malformed("unexpected end of input")),
                    },
                    Some('"') => break,
                    Some(c) => item.push(c),
                    None => return Err(self.malformed("unterminated quoted element")),
                }
            }
            return Ok(item);
        }

        while let Some(&c) = self.chars.peek() {
            match c {
                ARRAY_DELIM | '}' => break,
                '{' | '"' => return Err(self.malformed(&format!("unexpected \"{c}\""))),
                '\\' => {
                    self.chars.next();
                    match self.chars.next() {
                        Some(escaped) => item.push(escaped),
                        None => return Err(self.malformed("unexpected end of input")),
                    }
                }
                _ => {
                    item.push(c);
                    self.chars.next();
                }
            }
        }
        let item = item.trim_end().to_string();
        if item.is_empty() {
            return Err(self.malformed("empty element"));
        }
        if item.eq_ignore_ascii_case("NULL") {
            return Err(HostError::invalid_input(format!(
                "array \"{}\" has null elements, which are not supported",
                self.text
            )));
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbridge_api::error::ErrorKind;

    fn io(oid: TypeOid) -> TypeInfo {
        BuiltinCatalog::new().lookup(oid).unwrap()
    }

    fn round_trip(oid: TypeOid, text: &str) -> String {
        let t = io(oid);
        let datum = t.input.input(text, -1).unwrap();
        t.output.output(&datum).unwrap()
    }

    #[test]
    fn scalar_types_round_trip() {
        assert_eq!(round_trip(BOOLOID, "true"), "t");
        assert_eq!(round_trip(INT2OID, " 12 "), "12");
        assert_eq!(round_trip(INT8OID, "-9000000000"), "-9000000000");
        assert_eq!(round_trip(FLOAT8OID, "1.5"), "1.5");
        assert_eq!(round_trip(FLOAT8OID, "Inf"), "Infinity");
        assert_eq!(round_trip(NUMERICOID, "+12.50"), "12.50");
        assert_eq!(round_trip(CASHOID, "$1,234.5"), "$1,234.50");
        assert_eq!(round_trip(CASHOID, "-0.07"), "-$0.07");
        assert_eq!(round_trip(TEXTOID, "  spaced "), "  spaced ");
    }

    #[test]
    fn integer_range_is_checked() {
        let err = io(INT2OID).input.input("40000", -1).unwrap_err();
        assert!(err.message().contains("out of range"));
        let err = io(INT4OID).input.input("1.5", -1).unwrap_err();
        assert!(err.message().contains("invalid input syntax"));
    }

    #[test]
    fn name_is_scalar_despite_element_type() {
        let name = io(NAMEOID);
        assert_eq!(name.elem, Some(CHAROID));
        assert!(!name.is_array());
        assert!(io(INT4ARRAYOID).is_array());
        assert_eq!(io(INT4ARRAYOID).element_type(), Some(INT4OID));
    }

    #[test]
    fn array_literal_two_dimensions() {
        let t = io(INT4ARRAYOID);
        let Datum::Array(a) = t.input.input("{{1,2},{3,4}}", -1).unwrap() else {
            panic!("expected array datum");
        };
        assert_eq!(a.dims(), &[2, 2]);
        assert_eq!(
            a.elements(),
            &[Datum::Int4(1), Datum::Int4(2), Datum::Int4(3), Datum::Int4(4)]
        );
        assert_eq!(t.output.output(&Datum::Array(a)).unwrap(), "{{1,2},{3,4}}");
    }

    #[test]
    fn array_literal_quoting() {
        let t = io(TEXTARRAYOID);
        let datum = t.input.input(r#"{"a b","say \"hi\"",plain}"#, -1).unwrap();
        assert_eq!(t.output.output(&datum).unwrap(), r#"{"a b","say \"hi\"",plain}"#);
    }

    #[test]
    fn array_literal_rejects_ragged_and_null() {
        let t = io(INT4ARRAYOID);
        assert!(t.input.input("{{1,2},{3}}", -1).is_err());
        assert!(t.input.input("{1,NULL}", -1).is_err());
        assert!(t.input.input("{1,2", -1).is_err());
        assert_eq!(t.output.output(&t.input.input("{}", -1).unwrap()).unwrap(), "{}");
    }

    #[test]
    fn array_literal_nesting_is_bounded() {
        let t = io(INT4ARRAYOID);
        let nested = |depth: usize| format!("{}1{}", "{".repeat(depth), "}".repeat(depth));

        let Datum::Array(a) = t.input.input(&nested(MAX_ARRAY_NESTING), -1).unwrap() else {
            panic!("expected array datum");
        };
        assert_eq!(a.dims(), &[1; MAX_ARRAY_NESTING]);

        for depth in [MAX_ARRAY_NESTING + 1, 200_000] {
            let err = t.input.input(&nested(depth), -1).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
            assert!(err.to_string().contains("exceeds the maximum"), "{err}");
        }
    }

    #[test]
    fn alias_shares_base_io() {
        let mut catalog = BuiltinCatalog::new();
        catalog
            .register_alias(FIRST_NORMAL_OID, "celsius", "float8", Some(FIRST_NORMAL_OID + 1))
            .unwrap();
        let alias = catalog.lookup(FIRST_NORMAL_OID).unwrap();
        assert_eq!(alias.class, TypeClass::Numeric64);
        let array = catalog.lookup(FIRST_NORMAL_OID + 1).unwrap();
        assert_eq!(array.element_type(), Some(FIRST_NORMAL_OID));

        assert!(catalog.register_alias(INT4OID, "dup", "int4", None).is_err());
        assert!(catalog.register_alias(FIRST_NORMAL_OID + 5, "x", "nope", None).is_err());
    }
}
