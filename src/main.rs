use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use mylang::runtime::context;
use mylang::runtime::scope::Scope;
use mylang::{lexer, parser};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut dump_tokens = false;
    let mut input_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dump-tokens" => {
                dump_tokens = true;
            }
            _ => {
                input_path = Some(arg);
                if args.next().is_some() {
                    bail!("Only one input file is supported");
                }
                break;
            }
        }
    }

    let source = if let Some(path) = input_path {
        fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let lexer = lexer::Lexer::new(&source)?;
    if dump_tokens {
        for token in lexer.tokens() {
            println!("{token}");
        }
        return Ok(());
    }

    let program = parser::parse(lexer)?;
    let mut scope = Scope::new();
    let mut ctx = context::Context::new();
    program.execute(&mut scope, &mut ctx)?;
    print!("{}", ctx.into_output());
    Ok(())
}
