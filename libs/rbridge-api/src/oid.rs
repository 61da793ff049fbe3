/// Relational type identifier.
pub type TypeOid = u32;

/// First identifier available to types created after bootstrap.
pub const FIRST_NORMAL_OID: TypeOid = 16_384;

pub const CHAROID: TypeOid = 18;
pub const BOOLOID: TypeOid = 16;
pub const NAMEOID: TypeOid = 19;
pub const INT8OID: TypeOid = 20;
pub const INT2OID: TypeOid = 21;
pub const INT4OID: TypeOid = 23;
pub const TEXTOID: TypeOid = 25;
pub const FLOAT4OID: TypeOid = 700;
pub const FLOAT8OID: TypeOid = 701;
pub const CASHOID: TypeOid = 790;
pub const BPCHAROID: TypeOid = 1042;
pub const VARCHAROID: TypeOid = 1043;
pub const NUMERICOID: TypeOid = 1700;

pub const BOOLARRAYOID: TypeOid = 1000;
pub const NAMEARRAYOID: TypeOid = 1003;
pub const INT2ARRAYOID: TypeOid = 1005;
pub const INT4ARRAYOID: TypeOid = 1007;
pub const TEXTARRAYOID: TypeOid = 1009;
pub const BPCHARARRAYOID: TypeOid = 1014;
pub const VARCHARARRAYOID: TypeOid = 1015;
pub const INT8ARRAYOID: TypeOid = 1016;
pub const FLOAT4ARRAYOID: TypeOid = 1021;
pub const FLOAT8ARRAYOID: TypeOid = 1022;
pub const CASHARRAYOID: TypeOid = 791;
pub const NUMERICARRAYOID: TypeOid = 1231;
