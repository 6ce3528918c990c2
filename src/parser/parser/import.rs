use crate::{
    domain::{FromImportPath, Identifier, ModulePath},
    lexer::Token,
    parser::{
        types::{FromImportItem, FromImportMode, RegularImport, StatementKind},
        Parser, ParserError,
    },
};

impl Parser<'_> {
    pub fn parse_module_path(&mut self) -> Result<ModulePath, ParserError> {
        if !matches!(self.current_token(), Token::Identifier(_)) {
            return Ok(ModulePath::default());
        }

        let mut path = vec![self.parse_identifier()?];
        while self.consume_optional(&Token::Dot) {
            path.push(self.parse_identifier()?);
        }
        Ok(ModulePath::new(path))
    }

    pub fn parse_import_path(&mut self) -> Result<FromImportPath, ParserError> {
        let mut levels = 0;
        loop {
            match self.current_token() {
                Token::Dot => levels += 1,
                // `from ... import x` lexes its dots as a single ellipsis.
                Token::Ellipsis => levels += 3,
                _ => break,
            }
            self.consume_current();
        }

        let path = self.parse_module_path()?;
        if levels > 0 {
            return Ok(FromImportPath::Relative(levels, path));
        }

        if path.is_empty() {
            return Err(self.syntax_error("invalid syntax"));
        }
        Ok(FromImportPath::Absolute(path))
    }

    pub fn parse_optional_alias(&mut self) -> Result<Option<Identifier>, ParserError> {
        if self.consume_optional(&Token::As) {
            let alias = self.parse_identifier()?;
            Ok(Some(alias))
        } else {
            Ok(None)
        }
    }

    pub(super) fn parse_regular_import(&mut self) -> Result<StatementKind, ParserError> {
        self.consume(&Token::Import)?;

        let mut items = vec![];
        loop {
            let module_path = self.parse_module_path()?;
            if module_path.is_empty() {
                return Err(self.syntax_error("invalid syntax"));
            }
            let alias = self.parse_optional_alias()?;
            items.push(RegularImport { module_path, alias });

            if !self.consume_optional(&Token::Comma) {
                break;
            }
        }

        Ok(StatementKind::RegularImport(items))
    }

    pub(super) fn parse_selective_import(&mut self) -> Result<StatementKind, ParserError> {
        self.consume(&Token::From)?;
        let import_path = self.parse_import_path()?;
        self.consume(&Token::Import)?;

        if self.consume_optional(&Token::Asterisk) {
            return Ok(StatementKind::SelectiveImport {
                import_path,
                mode: FromImportMode::All,
            });
        }

        let parenthesized = self.consume_optional(&Token::LParen);

        let mut items = Vec::new();
        loop {
            let symbol = self.parse_identifier()?;
            let item = match self.parse_optional_alias()? {
                Some(alias) => FromImportItem::aliased(symbol, alias),
                None => FromImportItem::direct(symbol),
            };
            items.push(item);

            if !self.consume_optional(&Token::Comma) {
                break;
            }
            // A trailing comma is only valid inside parentheses.
            if parenthesized && self.current_token() == &Token::RParen {
                break;
            }
        }

        if parenthesized {
            self.consume(&Token::RParen)?;
        }

        Ok(StatementKind::SelectiveImport {
            import_path,
            mode: FromImportMode::List(items),
        })
    }
}
