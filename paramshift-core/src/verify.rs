//! Syntax verification of transformed output using SWC
//!
//! The engine works on text, so a rewritten file is re-parsed before it is
//! written back. Anything the parser rejects, including recoverable errors,
//! fails verification.

use anyhow::Result;
use swc_common::{sync::Lrc, FileName, SourceFile, SourceMap};
use swc_ecma_ast::EsVersion;
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

/// Parser configuration for a route file, chosen by extension
fn syntax_for_file(filename: &str) -> Syntax {
    if filename.ends_with(".tsx") {
        Syntax::Typescript(swc_ecma_parser::TsSyntax {
            tsx: true,
            ..Default::default()
        })
    } else if filename.ends_with(".js") || filename.ends_with(".mjs") || filename.ends_with(".cjs") {
        Syntax::Es(swc_ecma_parser::EsSyntax {
            jsx: false,
            ..Default::default()
        })
    } else if filename.ends_with(".jsx") {
        Syntax::Es(swc_ecma_parser::EsSyntax {
            jsx: true,
            ..Default::default()
        })
    } else {
        // Route handlers are TypeScript unless stated otherwise
        Syntax::Typescript(swc_ecma_parser::TsSyntax {
            tsx: false,
            dts: filename.ends_with(".d.ts"),
            ..Default::default()
        })
    }
}

/// Check that `src` still parses as a module
pub fn verify_syntax(src: &str, filename: &str) -> Result<()> {
    let source_map: Lrc<SourceMap> = Default::default();
    let source_file: Lrc<SourceFile> = source_map.new_source_file(
        FileName::Custom(filename.into()).into(),
        src.to_string(),
    );

    let lexer = Lexer::new(
        syntax_for_file(filename),
        EsVersion::Es2022,
        StringInput::from(&*source_file),
        None,
    );
    let mut parser = Parser::new_from(lexer);

    parser.parse_module().map_err(|e| {
        anyhow::anyhow!("Parse error: {}", e.kind().msg())
            .context(format!("transformed source no longer parses: {}", filename))
    })?;

    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(anyhow::anyhow!("Parse error: {}", e.kind().msg())
            .context(format!("transformed source no longer parses: {}", filename)));
    }

    Ok(())
}
