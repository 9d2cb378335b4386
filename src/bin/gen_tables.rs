// src/bin/gen_tables.rs
// Build the sample grammar's tables once and write them to disk.
// Usage:
//   cargo run --bin gen_tables                # writes into tables/
//   cargo run --bin gen_tables -- /path/out   # writes into /path/out/
//
// Files: parse_table.json, parse_table.bin, lex_table.json

use std::{env, fs, path::Path};

use sitter_runtime::{
    lexer::tables::save_lex_table_json,
    parser::{parse_table_to_bin, save_parse_table_bin, save_parse_table_json},
    sample,
};

fn main() {
    let out = env::args().nth(1).unwrap_or_else(|| "tables".to_string());
    let out_dir = Path::new(&out);

    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("error: failed to create {}: {e}", out_dir.display());
        std::process::exit(1);
    }

    println!("[gen_tables] building sample grammar tables…");
    let table = match sample::build_parse_table() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e:?}");
            std::process::exit(1);
        }
    };
    let lex = sample::lex::build_lex_table();

    let actions = table.actions();
    println!(
        "[gen_tables] {} states ({} dense), {} symbols, {} action lists / {} actions, {} sparse words, bin = {} bytes",
        table.state_count(),
        table.large_state_count(),
        table.symbol_count(),
        actions.headers.len(),
        actions.actions.len(),
        table.sparse().data.len(),
        parse_table_to_bin(&table).len()
    );

    let results = [
        ("parse_table.json", save_parse_table_json(&out_dir.join("parse_table.json"), &table)),
        ("parse_table.bin", save_parse_table_bin(&out_dir.join("parse_table.bin"), &table)),
        ("lex_table.json", save_lex_table_json(&out_dir.join("lex_table.json"), &lex)),
    ];
    for (name, r) in results {
        match r {
            Ok(()) => println!("[gen_tables] wrote {}", out_dir.join(name).display()),
            Err(e) => {
                eprintln!("error: failed to write {name}: {e:?}");
                std::process::exit(1);
            }
        }
    }
}
