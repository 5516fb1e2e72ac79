use std::io::Write;
use study_core::ports::{CodeWriter, Result};

/// Renders codes as `label,code` lines for the participant spreadsheet
pub struct LineListWriter {
    label: String,
}

impl LineListWriter {
    pub fn new(label: String) -> Self {
        Self { label }
    }

    fn format_lines(&self, codes: &[String]) -> String {
        let mut output = String::new();
        for code in codes {
            output.push_str(&format!("{},{}\n", self.label, code));
        }
        output
    }
}

impl CodeWriter for LineListWriter {
    fn write(&self, codes: &[String], out: &mut dyn Write) -> Result<()> {
        out.write_all(self.format_lines(codes).as_bytes())?;
        Ok(())
    }
}

/// Renders codes as a multi-row `INSERT` for the code-redemption table
pub struct SqlInsertWriter {
    table: String,
}

impl SqlInsertWriter {
    pub fn new(table: String) -> Self {
        Self { table }
    }

    fn format_statement(&self, codes: &[String]) -> String {
        let values: Vec<String> = codes
            .iter()
            .map(|code| format!("('{}')", quote_literal(code)))
            .collect();

        let mut output = String::new();
        output.push_str(&format!("INSERT INTO {} (code) VALUES\n", self.table));
        output.push_str(&values.join(",\n"));
        output.push_str("\n;\n");
        output
    }
}

impl CodeWriter for SqlInsertWriter {
    fn write(&self, codes: &[String], out: &mut dyn Write) -> Result<()> {
        out.write_all(self.format_statement(codes).as_bytes())?;
        Ok(())
    }
}

fn quote_literal(value: &str) -> String {
    value.replace('\'', "''")
}
