//! Fixed-format card text.
//!
//! Small-field cards use 8-character columns with eight data fields per
//! line; large-field cards mark the name with `*` and carry four
//! 16-character data fields per line.

use shell_core::fields::{CardPrinter, Field};

pub struct FixedFormatPrinter;

fn format_float(value: f64, width: usize) -> String {
    let plain = format!("{:?}", value);
    if plain.len() <= width {
        return plain;
    }
    (0..width)
        .rev()
        .map(|precision| format!("{:.*e}", precision, value))
        .find(|s| s.len() <= width)
        .unwrap_or(plain)
}

fn format_field(field: &Option<Field>, width: usize) -> String {
    let text = match field {
        None => String::new(),
        Some(Field::Float(v)) => format_float(*v, width),
        Some(other) => other.to_string(),
    };
    format!("{:<width$}", text, width = width)
}

fn print_card(fields: &[Option<Field>], width: usize, per_line: usize, large: bool) -> String {
    let last = fields.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
    let fields = &fields[..last];
    let Some((name, data)) = fields.split_first() else {
        return String::new();
    };

    let name = name.as_ref().map(|f| f.to_string()).unwrap_or_default();
    let mut lines = Vec::new();
    let mut chunks = data.chunks(per_line);
    let first = chunks.next().unwrap_or(&[]);

    let head = if large { format!("{}*", name) } else { name };
    lines.push(format!("{:<8}{}", head, render(first, width)));
    for chunk in chunks {
        let lead = if large { "*" } else { "" };
        lines.push(format!("{:<8}{}", lead, render(chunk, width)));
    }
    lines
        .iter()
        .map(|line| line.trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

fn render(fields: &[Option<Field>], width: usize) -> String {
    fields.iter().map(|f| format_field(f, width)).collect()
}

impl CardPrinter for FixedFormatPrinter {
    fn print_card_8(&self, fields: &[Option<Field>]) -> String {
        print_card(fields, 8, 8, false)
    }

    fn print_card_16(&self, fields: &[Option<Field>]) -> String {
        print_card(fields, 16, 4, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pshear() -> Vec<Option<Field>> {
        vec![
            Some(Field::from("PSHEAR")),
            Some(Field::Int(10)),
            Some(Field::Int(20)),
            Some(Field::Float(0.05)),
            None,
            None,
        ]
    }

    #[test]
    fn test_small_field() {
        let text = FixedFormatPrinter.print_card_8(&pshear());
        assert_eq!(text, "PSHEAR  10      20      0.05\n");
    }

    #[test]
    fn test_large_field() {
        let text = FixedFormatPrinter.print_card_16(&pshear());
        assert_eq!(text, format!("PSHEAR* {:<16}{:<16}0.05\n", 10, 20));
    }

    #[test]
    fn test_continuation() {
        let mut fields = vec![Some(Field::from("PCOMP")), Some(Field::Int(1))];
        fields.extend(std::iter::repeat(None).take(7));
        fields.push(Some(Field::Int(300704)));
        let text = FixedFormatPrinter.print_card_8(&fields);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["PCOMP   1", "        300704"]);
    }

    #[test]
    fn test_long_float_fits() {
        let s = format_float(1.549e-2 / 3.0, 8);
        assert!(s.len() <= 8, "{}", s);
        assert!((s.parse::<f64>().unwrap() - 1.549e-2 / 3.0).abs() < 1e-4);
    }
}
