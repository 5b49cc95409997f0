// ============================================================
// Layer 5 — Plain Text Tables
// ============================================================
// Reports embed small tables rendered as fixed-width text:
//
//        step  rows_before  rows_after  rows_removed
//   raw_input          100         100             0
//       basic          100          97             3
//
// Every column is right-aligned to its widest cell, columns are
// separated by two spaces, and there is no index column.

pub struct TextTable {
    header: Vec<String>,
    rows:   Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows:   Vec::new(),
        }
    }

    pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn render(&self) -> String {
        let cols = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; cols];
        for row in std::iter::once(&self.header).chain(&self.rows) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        std::iter::once(&self.header)
            .chain(&self.rows)
            .map(|row| {
                (0..cols)
                    .map(|i| {
                        let cell = row.get(i).map(String::as_str).unwrap_or("");
                        format!("{:>width$}", cell, width = widths[i])
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `1234567` → `1,234,567`
pub fn thousands(n: impl std::fmt::Display) -> String {
    let text = n.to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None       => ("", text.as_str()),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push_str(sign);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Fixed precision with `nan` for missing results
pub fn fixed(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{value:.precision$}")
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_aligned_columns() {
        let mut t = TextTable::new(["step", "rows"]);
        t.push_row(["raw_input", "100"]);
        t.push_row(["basic", "7"]);
        assert_eq!(
            t.render(),
            "     step  rows\nraw_input   100\n    basic     7"
        );
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0usize), "0");
        assert_eq!(thousands(999usize), "999");
        assert_eq!(thousands(1000usize), "1,000");
        assert_eq!(thousands(1234567u64), "1,234,567");
        assert_eq!(thousands(-12345i64), "-12,345");
    }

    #[test]
    fn test_fixed_nan() {
        assert_eq!(fixed(f64::NAN, 3), "nan");
        assert_eq!(fixed(1.23456, 3), "1.235");
    }
}
