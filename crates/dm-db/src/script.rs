//! Patch script backend.
//!
//! Instead of executing, statements are appended to a script that the
//! engine's own client can run (`sqlplus @patch.sql` or
//! `mysql < patch.sql`). Each statement is terminated the way that client
//! expects.

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use dm_core::DatabaseEngine;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Writes statements to an executable patch file
pub struct ScriptBackend {
    engine: DatabaseEngine,
    path: PathBuf,
    out: Mutex<BufWriter<File>>,
    statements: Mutex<usize>,
}

impl ScriptBackend {
    /// Create (or truncate) the script at `path`
    pub fn create(path: &Path, engine: DatabaseEngine) -> DbResult<Self> {
        let write_err = |source| DbError::ScriptWrite {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let file = File::create(path).map_err(write_err)?;
        let mut out = BufWriter::new(file);
        writeln!(out, "{}", header(engine)).map_err(write_err)?;

        Ok(Self {
            engine,
            path: path.to_path_buf(),
            out: Mutex::new(out),
            statements: Mutex::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn engine(&self) -> DatabaseEngine {
        self.engine
    }

    /// Number of statements written so far
    pub fn statement_count(&self) -> usize {
        self.statements.lock().map(|n| *n).unwrap_or(0)
    }

    /// Flush buffered output to disk
    pub fn finish(&self) -> DbResult<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        out.flush().map_err(|source| self.write_error(source))?;
        log::info!(
            "Wrote {} statements to {}",
            self.statement_count(),
            self.path.display()
        );
        Ok(())
    }

    /// Shell command that runs the generated script
    pub fn run_instructions(&self) -> String {
        match self.engine {
            DatabaseEngine::Oracle => {
                format!("sqlplus <user>/<password>@<tns> @{}", self.path.display())
            }
            DatabaseEngine::MySql => {
                format!("mysql -u <user> -p <database> < {}", self.path.display())
            }
        }
    }

    fn write_error(&self, source: std::io::Error) -> DbError {
        DbError::ScriptWrite {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn append(&self, text: &str) -> DbResult<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        writeln!(out, "{}", text).map_err(|source| self.write_error(source))
    }
}

fn header(engine: DatabaseEngine) -> String {
    match engine {
        DatabaseEngine::Oracle => {
            "-- dbmorph patch script (oracle)\nWHENEVER SQLERROR EXIT SQL.SQLCODE\nSET DEFINE OFF\n"
                .to_string()
        }
        DatabaseEngine::MySql => "-- dbmorph patch script (mysql)\n".to_string(),
    }
}

/// Render one statement with the terminator the engine's client expects
pub fn render_statement(engine: DatabaseEngine, sql: &str) -> String {
    let sql = sql.trim();
    match engine {
        DatabaseEngine::Oracle => {
            let sql = sql.strip_suffix('/').map(str::trim_end).unwrap_or(sql);
            if is_plsql_unit(sql) {
                format!("{}\n/\n", sql)
            } else {
                format!("{};\n", sql.trim_end_matches(';').trim_end())
            }
        }
        DatabaseEngine::MySql => {
            let body = sql.trim_end_matches(';').trim_end();
            if is_mysql_routine(sql) {
                format!("DELIMITER $$\n{}$$\nDELIMITER ;\n", body)
            } else {
                format!("{};\n", body)
            }
        }
    }
}

fn leading_words(sql: &str, n: usize) -> Vec<String> {
    sql.split_whitespace()
        .take(n)
        .map(|w| w.to_ascii_uppercase())
        .collect()
}

/// Anonymous blocks and stored units that SQL*Plus runs on a `/` line
fn is_plsql_unit(sql: &str) -> bool {
    let words = leading_words(sql, 5);
    let words: Vec<&str> = words.iter().map(String::as_str).collect();
    match words.as_slice() {
        ["BEGIN", ..] | ["DECLARE", ..] => true,
        ["CREATE", "OR", "REPLACE", rest @ ..] | ["CREATE", rest @ ..] => {
            let rest = match rest {
                ["EDITIONABLE", tail @ ..] | ["NONEDITIONABLE", tail @ ..] => tail,
                other => other,
            };
            matches!(
                rest.first(),
                Some(&"PACKAGE")
                    | Some(&"FUNCTION")
                    | Some(&"PROCEDURE")
                    | Some(&"TRIGGER")
                    | Some(&"TYPE")
            )
        }
        _ => false,
    }
}

/// Routine bodies that need a non-`;` delimiter in the mysql client
fn is_mysql_routine(sql: &str) -> bool {
    let words = leading_words(sql, 4);
    if words.first().map(String::as_str) != Some("CREATE") {
        return false;
    }
    words.iter().skip(1).any(|w| {
        matches!(w.as_str(), "FUNCTION" | "PROCEDURE" | "TRIGGER" | "EVENT")
    })
}

#[async_trait]
impl Database for ScriptBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.append(&render_statement(self.engine, sql))?;
        let mut count = self
            .statements
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        *count += 1;
        Ok(0)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute(sql).await.map(|_| ())
    }

    async fn comment(&self, text: &str) -> DbResult<()> {
        let lines: Vec<String> = text.lines().map(|l| format!("-- {}", l)).collect();
        self.append(&lines.join("\n"))
    }

    async fn relation_exists(&self, _name: &str) -> DbResult<bool> {
        Err(DbError::NotSupported {
            backend: "script",
            feature: "relation_exists",
        })
    }

    async fn query_count(&self, _sql: &str) -> DbResult<usize> {
        Err(DbError::NotSupported {
            backend: "script",
            feature: "query_count",
        })
    }

    fn db_type(&self) -> &'static str {
        match self.engine {
            DatabaseEngine::Oracle => "oracle-script",
            DatabaseEngine::MySql => "mysql-script",
        }
    }
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
