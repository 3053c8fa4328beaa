pub mod ast;
pub mod config;
pub mod datetime;
pub mod error;
pub mod export;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod schema;
pub mod utils;
pub mod validator;
pub mod writer;

pub use ast::{Document, Metadata, NodeId, Tree, Value};
pub use config::SkemaConfig;
pub use datetime::Datetime;
pub use error::{Diagnostic, DiagnosticKind, SkemaError};
pub use parser::{ParseOptions, Parser};
pub use schema::{Schema, SchemaId, SchemaNode};
pub use validator::{Mismatch, validate};
pub use writer::{write_document, write_schema, write_value};

/// Highest `@version` this crate reads.
pub const FORMAT_VERSION: i64 = 1;

/// Parse a document, failing if any diagnostic was recorded.
pub fn parse_document(source: &str) -> Result<Document, SkemaError> {
    parse_decoded_document(source, Vec::new())
}

/// Like [`parse_document`], for raw bytes that may start with a UTF-8 BOM.
/// Bytes that are not UTF-8 fail the parse with code 104.
pub fn parse_document_bytes(bytes: &[u8]) -> Result<Document, SkemaError> {
    let (source, faults) = lexer::decode_source_with_faults(bytes);
    parse_decoded_document(&source, faults)
}

pub(crate) fn parse_decoded_document(
    source: &str,
    faults: Vec<lexer::EncodingFault>,
) -> Result<Document, SkemaError> {
    let mut parser = Parser::new(source).with_encoding_faults(faults);
    let document = parser.parse_document();
    strict(parser, document)
}

/// Parse and resolve a schema, failing on any diagnostic or on an
/// unresolvable reference.
pub fn parse_schema(source: &str) -> Result<Schema, SkemaError> {
    parse_decoded_schema(source, Vec::new())
}

pub fn parse_schema_bytes(bytes: &[u8]) -> Result<Schema, SkemaError> {
    let (source, faults) = lexer::decode_source_with_faults(bytes);
    parse_decoded_schema(&source, faults)
}

fn parse_decoded_schema(
    source: &str,
    faults: Vec<lexer::EncodingFault>,
) -> Result<Schema, SkemaError> {
    let mut parser = Parser::new(source).with_encoding_faults(faults);
    let schema = parser.parse_schema();
    let mut schema = strict(parser, schema)?;
    resolver::resolve(&mut schema)?;
    Ok(schema)
}

fn strict<T>(parser: Parser<'_>, parsed: T) -> Result<T, SkemaError> {
    if parser.error_count() == 0 {
        Ok(parsed)
    } else {
        Err(SkemaError::Parse { diagnostics: parser.into_diagnostics() })
    }
}
