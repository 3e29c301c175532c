// token.rs

use crate::span::Span;

/// Single source of truth for keyword-to-token mapping.
///
/// Each entry `"text" => Variant` generates:
/// - A match arm in `TokenType::keyword_type`: `"text" => Some(TokenType::Variant)`
/// - A match arm in `TokenType::as_str`:       `Self::Variant => "text"`
macro_rules! define_keywords {
    ( $( $text:literal => $variant:ident ),+ $(,)? ) => {
        impl TokenType {
            /// Check if a string is a keyword and return its token type.
            pub fn keyword_type(text: &str) -> Option<TokenType> {
                match text {
                    $( $text => Some(TokenType::$variant), )+
                    _ => None,
                }
            }

            fn keyword_as_str(&self) -> Option<&'static str> {
                match self {
                    $( Self::$variant => Some($text), )+
                    _ => None,
                }
            }
        }
    };
}

define_keywords! {
    "class"   => KwClass,
    "extends" => KwExtends,
    "is"      => KwIs,
    "end"     => KwEnd,
    "var"     => KwVar,
    "method"  => KwMethod,
    "this"    => KwThis,
    "while"   => KwWhile,
    "loop"    => KwLoop,
    "if"      => KwIf,
    "then"    => KwThen,
    "else"    => KwElse,
    "return"  => KwReturn,
    "true"    => KwTrue,
    "false"   => KwFalse,
}

/// All token types in the O language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Literals
    IntLiteral,
    RealLiteral,
    Identifier,

    // Keywords
    KwClass,
    KwExtends,
    KwIs,
    KwEnd,
    KwVar,
    KwMethod,
    KwThis,
    KwWhile,
    KwLoop,
    KwIf,
    KwThen,
    KwElse,
    KwReturn,
    KwTrue,
    KwFalse,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Colon,
    ColonEq,
    FatArrow,

    Eof,
}

impl TokenType {
    /// Human-readable token name for diagnostics.
    pub fn as_str(&self) -> &'static str {
        if let Some(kw) = self.keyword_as_str() {
            return kw;
        }
        match self {
            Self::IntLiteral => "integer literal",
            Self::RealLiteral => "real literal",
            Self::Identifier => "identifier",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Colon => ":",
            Self::ColonEq => ":=",
            Self::FatArrow => "=>",
            Self::Eof => "end of input",
            _ => unreachable!("keyword handled above"),
        }
    }

    /// Tokens that may begin an expression. Used to decide whether a
    /// `return` statement carries a value.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            Self::IntLiteral
                | Self::RealLiteral
                | Self::Identifier
                | Self::KwThis
                | Self::KwTrue
                | Self::KwFalse
                | Self::LParen
        )
    }
}

/// A single lexed token.
#[derive(Debug, Clone)]
pub struct Token {
    pub ty: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(ty: TokenType, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            ty,
            lexeme: lexeme.into(),
            span,
        }
    }
}
