use der::asn1::{Any, ObjectIdentifier, OctetString};
use der::Sequence;

/// ```text
/// Extension ::= SEQUENCE {
///     extnID      OBJECT IDENTIFIER,
///     critical    BOOLEAN DEFAULT FALSE,
///     extnValue   OCTET STRING }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Extension {
    pub extn_id: ObjectIdentifier,

    #[asn1(default = "Default::default")]
    pub critical: bool,

    pub extn_value: OctetString,
}

/// ```text
/// Extensions ::= SEQUENCE SIZE (1..MAX) OF Extension
/// ```
pub type Extensions = Vec<Extension>;

/// `statementInfo` stays opaque; only the statement ids are ever inspected.
///
/// ```text
/// QCStatement ::= SEQUENCE {
///     statementId     OBJECT IDENTIFIER,
///     statementInfo   ANY DEFINED BY statementId OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct QcStatement {
    pub statement_id: ObjectIdentifier,
    pub statement_info: Option<Any>,
}

/// ```text
/// QCStatements ::= SEQUENCE OF QCStatement
/// ```
pub type QcStatements = Vec<QcStatement>;

/// True if any statement carries `id`
pub fn has_statement(statements: &[QcStatement], id: &ObjectIdentifier) -> bool {
    statements.iter().any(|s| &s.statement_id == id)
}
