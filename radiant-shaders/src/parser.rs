//! Material declaration files (`.mtr`).
//!
//! Only the parts the shader system needs are interpreted; anything else inside
//! a material block is tokenized and ignored.  A malformed declaration is
//! reported and skipped without giving up on the rest of the file.

use crate::material::{MaterialFlags, MaterialStage, ShaderDefinition, StageBlend};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{file}:{line}: {reason}")]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Word,
    Quoted,
    Open,
    Close,
    Punct,
}

#[derive(Debug, Clone)]
struct Token {
    kind: Kind,
    text: String,
    line: usize,
}

impl Token {
    fn is(&self, kind: Kind) -> bool {
        self.kind == kind
    }

    fn is_punct(&self, c: &str) -> bool {
        self.kind == Kind::Punct && self.text == c
    }
}

/// true when `chars` is positioned on `//` or `/*`
fn starts_comment(mut chars: std::iter::Peekable<std::str::Chars>) -> bool {
    chars.next() == Some('/') && matches!(chars.peek(), Some('/') | Some('*'))
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '"' => {
                let start = line;
                let mut text = String::new();
                for c in chars.by_ref() {
                    match c {
                        '"' => break,
                        '\n' => {
                            line += 1;
                            text.push(c)
                        }
                        _ => text.push(c),
                    }
                }
                tokens.push(Token {
                    kind: Kind::Quoted,
                    text,
                    line: start,
                });
            }
            '{' | '}' | '(' | ')' | ',' => tokens.push(Token {
                kind: match c {
                    '{' => Kind::Open,
                    '}' => Kind::Close,
                    _ => Kind::Punct,
                },
                text: c.to_string(),
                line,
            }),
            _ => {
                let mut text = c.to_string();
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || "{}(),\"".contains(next) {
                        break;
                    }
                    if next == '/' && starts_comment(chars.clone()) {
                        break;
                    }
                    text.push(next);
                    chars.next();
                }
                tokens.push(Token {
                    kind: Kind::Word,
                    text,
                    line,
                });
            }
        }
    }

    tokens
}

/// Declarations in material files that are not materials
const SKIPPED_DECLS: &[&str] = &["table", "skin", "particle", "sound", "fx"];

struct Parser<'a> {
    file: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, line: usize, reason: impl Into<String>) -> ParseError {
        ParseError {
            file: self.file.to_string(),
            line,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let rval = self.tokens.get(self.pos).cloned();
        if rval.is_some() {
            self.pos += 1;
        }
        rval
    }

    /// Tokens between an already consumed `{` and its matching `}`
    fn block_body(&mut self, open_line: usize) -> Result<Vec<Token>, ParseError> {
        let mut depth = 1;
        let mut body = Vec::new();
        while let Some(token) = self.next() {
            match token.kind {
                Kind::Open => depth += 1,
                Kind::Close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(body);
                    }
                }
                _ => {}
            }
            body.push(token);
        }
        Err(self.error(
            open_line,
            format!("unterminated block opened at line {}", open_line),
        ))
    }

    fn parse_all(&mut self) -> (Vec<ShaderDefinition>, Vec<ParseError>) {
        let mut definitions = Vec::new();
        let mut errors = Vec::new();

        while let Some(token) = self.next() {
            match token.kind {
                Kind::Open => {
                    errors.push(self.error(token.line, "block without a name"));
                    if let Err(e) = self.block_body(token.line) {
                        errors.push(e);
                    }
                    continue;
                }
                Kind::Close => {
                    errors.push(self.error(token.line, "unexpected '}'"));
                    continue;
                }
                _ => {}
            }

            let keyword = token.text.to_ascii_lowercase();
            let name_token = if SKIPPED_DECLS.contains(&keyword.as_str()) || keyword == "material"
            {
                match self.next() {
                    Some(name) if name.is(Kind::Word) || name.is(Kind::Quoted) => name,
                    _ => {
                        errors.push(self.error(token.line, format!("{} without a name", keyword)));
                        continue;
                    }
                }
            } else {
                token
            };

            match self.peek() {
                Some(open) if open.is(Kind::Open) => {}
                _ => {
                    // leave the offending token for the next round
                    errors.push(self.error(
                        name_token.line,
                        format!("expected '{{' after {}", name_token.text),
                    ));
                    continue;
                }
            }
            let open_line = self.next().map(|t| t.line).unwrap_or(name_token.line);

            let body = match self.block_body(open_line) {
                Ok(body) => body,
                Err(e) => {
                    errors.push(e);
                    break;
                }
            };

            if SKIPPED_DECLS.contains(&keyword.as_str()) {
                continue;
            }

            match self.interpret_material(&name_token.text, body) {
                Ok(definition) => definitions.push(definition),
                Err(e) => errors.push(e),
            }
        }

        (definitions, errors)
    }

    fn interpret_material(
        &self,
        name: &str,
        body: Vec<Token>,
    ) -> Result<ShaderDefinition, ParseError> {
        let mut definition = ShaderDefinition::new(name, self.file);
        let mut body = TokenCursor::new(body);

        while let Some(token) = body.next() {
            match token.kind {
                Kind::Open => {
                    let stage = body.take_block();
                    definition.stages.push(self.interpret_stage(stage)?);
                    continue;
                }
                Kind::Close | Kind::Punct | Kind::Quoted => continue,
                Kind::Word => {}
            }

            match token.text.to_ascii_lowercase().as_str() {
                "description" => {
                    definition.description = body.argument(self, &token)?.text;
                }
                "qer_editorimage" => {
                    definition.editor_image = Some(body.argument(self, &token)?.text);
                }
                "diffusemap" | "bumpmap" | "specularmap" => {
                    let map = body.map_expression(self, &token)?;
                    definition.stages.push(MaterialStage {
                        blend: StageBlend::from_keyword(&token.text),
                        map: Some(map),
                    });
                }
                "translucent" => definition.flags |= MaterialFlags::TRANSLUCENT,
                "twosided" => definition.flags |= MaterialFlags::TWO_SIDED,
                "noshadows" => definition.flags |= MaterialFlags::NO_SHADOWS,
                _ => {}
            }
        }

        definition.resolve_interaction_maps();
        Ok(definition)
    }

    fn interpret_stage(&self, tokens: Vec<Token>) -> Result<MaterialStage, ParseError> {
        let mut stage = MaterialStage {
            blend: StageBlend::Other(String::new()),
            map: None,
        };
        let mut body = TokenCursor::new(tokens);

        while let Some(token) = body.next() {
            if token.is(Kind::Open) {
                body.take_block();
                continue;
            }
            if !token.is(Kind::Word) {
                continue;
            }
            match token.text.to_ascii_lowercase().as_str() {
                "blend" => {
                    let mut blend = body.argument(self, &token)?.text;
                    if body.peek().is_some_and(|t| t.is_punct(",")) {
                        body.next();
                        let dst = body.argument(self, &token)?.text;
                        blend = format!("{}, {}", blend, dst);
                    }
                    stage.blend = StageBlend::from_keyword(&blend);
                }
                "map" => stage.map = Some(body.map_expression(self, &token)?),
                _ => {}
            }
        }

        Ok(stage)
    }
}

struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let rval = self.tokens.get(self.pos).cloned();
        if rval.is_some() {
            self.pos += 1;
        }
        rval
    }

    /// Tokens up to the `}` matching an already consumed `{`.
    /// Block bodies are balanced by construction.
    fn take_block(&mut self) -> Vec<Token> {
        let mut depth = 1;
        let mut rval = Vec::new();
        while let Some(token) = self.next() {
            match token.kind {
                Kind::Open => depth += 1,
                Kind::Close => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            rval.push(token);
        }
        rval
    }

    fn argument(&mut self, parser: &Parser, keyword: &Token) -> Result<Token, ParseError> {
        match self.peek() {
            Some(t) if t.is(Kind::Word) || t.is(Kind::Quoted) => {
                let t = t.clone();
                self.pos += 1;
                Ok(t)
            }
            Some(t) => Err(parser.error(t.line, format!("missing argument to {}", keyword.text))),
            None => Err(parser.error(
                keyword.line,
                format!("missing argument to {}", keyword.text),
            )),
        }
    }

    /// A map argument: a plain image path, or an image program expression such
    /// as `addnormals(a, heightmap(b, 4))`.  Returns the primary image path.
    fn map_expression(&mut self, parser: &Parser, keyword: &Token) -> Result<String, ParseError> {
        let head = self.argument(parser, keyword)?;
        if !self.peek().is_some_and(|t| t.is_punct("(")) {
            return Ok(head.text);
        }

        let mut depth = 0;
        let mut first_image = None;
        while let Some(token) = self.next() {
            if token.is_punct("(") {
                depth += 1;
            } else if token.is_punct(")") {
                depth -= 1;
                if depth == 0 {
                    return first_image.ok_or_else(|| {
                        parser.error(head.line, format!("no image in {} expression", head.text))
                    });
                }
            } else if token.is(Kind::Open) || token.is(Kind::Close) {
                break;
            } else if first_image.is_none()
                && (token.is(Kind::Word) || token.is(Kind::Quoted))
                && !self.peek().is_some_and(|t| t.is_punct("("))
                && token.text.parse::<f32>().is_err()
            {
                first_image = Some(token.text);
            }
        }

        Err(parser.error(
            head.line,
            format!("unbalanced parentheses in {} expression", head.text),
        ))
    }
}

/// Parse one material file.  `file` is only used to label definitions and errors.
pub fn parse_material_source(file: &str, text: &str) -> (Vec<ShaderDefinition>, Vec<ParseError>) {
    let mut parser = Parser {
        file,
        tokens: tokenize(text),
        pos: 0,
    };
    parser.parse_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (Vec<ShaderDefinition>, Vec<ParseError>) {
        parse_material_source("test.mtr", text)
    }

    #[test]
    fn parses_a_typical_material() {
        let (defs, errors) = parse(
            r#"
// a comment
textures/base_wall/concrete
{
    description "plain concrete"
    qer_editorimage textures/base_wall/concrete_ed
    /* block
       comment */
    diffusemap textures/base_wall/concrete_d
    bumpmap    textures/base_wall/concrete_local
    {
        blend specularmap
        map textures/base_wall/concrete_s
    }
    twosided
}
"#,
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(defs.len(), 1);
        let def = &defs[0];
        assert_eq!(def.name, "textures/base_wall/concrete");
        assert_eq!(def.file, "test.mtr");
        assert_eq!(def.description, "plain concrete");
        assert_eq!(
            def.editor_image.as_deref(),
            Some("textures/base_wall/concrete_ed")
        );
        assert_eq!(def.diffuse.as_deref(), Some("textures/base_wall/concrete_d"));
        assert_eq!(def.bump.as_deref(), Some("textures/base_wall/concrete_local"));
        assert_eq!(def.specular.as_deref(), Some("textures/base_wall/concrete_s"));
        assert_eq!(def.stages.len(), 3);
        assert_eq!(def.flags, MaterialFlags::TWO_SIDED);
    }

    #[test]
    fn comments_end_a_word_without_whitespace() {
        let (defs, errors) = parse(
            "textures/a {\n\
               diffusemap textures/a_d// trailing note\n\
               bumpmap textures/a_local/* inline */\n\
               specularmap textures/dir/a_s\n\
             }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(defs[0].diffuse.as_deref(), Some("textures/a_d"));
        assert_eq!(defs[0].bump.as_deref(), Some("textures/a_local"));
        assert_eq!(defs[0].specular.as_deref(), Some("textures/dir/a_s"));
    }

    #[test]
    fn tables_and_material_keyword() {
        let (defs, errors) = parse(
            "table sinTable { { 0, 1, 0, -1 } }\n\
             material textures/a { translucent }\n\
             skin models/b { foo bar }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "textures/a");
        assert!(defs[0].is_translucent());
    }

    #[test]
    fn image_program_expressions_reduce_to_first_image() {
        let (defs, errors) = parse(
            "textures/a {\n\
               bumpmap addnormals(textures/a_local, heightmap(textures/a_h, 4))\n\
               { blend gl_one, gl_zero map makeIntensity(textures/a_glow) }\n\
             }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(defs[0].bump.as_deref(), Some("textures/a_local"));
        assert_eq!(
            defs[0].stages[1],
            MaterialStage {
                blend: StageBlend::Other("gl_one, gl_zero".into()),
                map: Some("textures/a_glow".into()),
            }
        );
    }

    #[test]
    fn stages_without_map_are_kept() {
        let (defs, errors) = parse("textures/tv { { blend add videomap video/static.roq } }");
        assert!(errors.is_empty());
        assert_eq!(defs[0].stages[0].map, None);
    }

    #[test]
    fn malformed_block_between_good_ones_is_skipped() {
        let (defs, errors) = parse(
            "textures/good1 { diffusemap textures/g1 }\n\
             textures/bad { diffusemap }\n\
             textures/good2 { diffusemap textures/g2 }\n",
        );
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["textures/good1", "textures/good2"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 2);
        assert!(errors[0].reason.contains("diffusemap"));
    }

    #[test]
    fn missing_open_brace_recovers_at_next_name() {
        let (defs, errors) = parse("textures/orphan\ntextures/next { }\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 1);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "textures/next");
    }

    #[test]
    fn unterminated_block_is_reported() {
        let (defs, errors) = parse("textures/a { diffusemap textures/a_d }\ntextures/b {\n { map x\n");
        assert_eq!(defs.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].reason.contains("unterminated"));
        assert_eq!(errors[0].to_string(), "test.mtr:2: unterminated block opened at line 2");
    }

    #[test]
    fn unbalanced_expression_is_reported() {
        let (defs, errors) = parse("textures/a { bumpmap heightmap(textures/a_h, 4 }");
        assert!(defs.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].reason.contains("unbalanced"));
    }

    #[test]
    fn stray_close_brace_is_reported() {
        let (defs, errors) = parse("}\ntextures/a { }");
        assert_eq!(defs.len(), 1);
        assert_eq!(errors[0].line, 1);
    }
}
