//! Minimal single-page PDFs for the fixture site's plan fact sheets.

use crate::{fixtures::PlanRow, FuelType};

const FONT_SIZE: u32 = 11;
const LEADING: u32 = 16;

/// A plan's fact sheet, worded like the retailer's real ones.
pub fn plan_fact_sheet(plan: &PlanRow) -> Vec<u8> {
    let fuel = plan.fuel.as_str();
    let fuel_lower = fuel.to_lowercase();
    let mut lines = vec![
        format!("{} - Energy Price Fact Sheet", plan.plan_name),
        format!("Plan BPID/EFS {}", plan.bpid),
        format!("Fuel type {}", fuel),
        "Customer type Residential".to_string(),
        format!("Distributor {}", plan.distributor),
        String::new(),
        format!(
            "This {} offer is available to customers in postcode {}.",
            fuel_lower, plan.postcode
        ),
        format!("{} charges", fuel),
        "Daily supply charge 98.45 cents per day".to_string(),
        format!("Estimated {} cost $1,480 per year", fuel_lower),
    ];
    if plan.fuel == FuelType::Gas {
        lines.push("Natural gas is supplied through the distributor's network.".to_string());
    }
    build_text_pdf(&lines)
}

/// Lays `lines` out top to bottom in Helvetica on one A4 page.
pub fn build_text_pdf<S: AsRef<str>>(lines: &[S]) -> Vec<u8> {
    let mut content = format!("BT\n/F1 {} Tf\n{} TL\n56 780 Td\n", FONT_SIZE, LEADING);
    for line in lines {
        content.push_str(&format!("({}) Tj\nT*\n", escape_text(line.as_ref())));
    }
    content.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] \
         /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}endstream", content.len(), content),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", index + 1, body).as_bytes());
    }

    let xref_offset = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{:010} 00000 n \n", offset));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}

fn escape_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .fold(String::with_capacity(text.len()), |mut out, c| {
            if matches!(c, '(' | ')' | '\\') {
                out.push('\\');
            }
            out.push(c);
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures::find_plan, plan_profile::classify};

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn xref_points_at_objects() {
        let pdf = build_text_pdf(&["Fuel type Gas"]);
        let text = String::from_utf8(pdf.clone()).unwrap();
        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));

        let startxref: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|line| line.parse().ok())
            .unwrap();
        assert_eq!(find(&pdf, b"xref\n"), Some(startxref));

        let entries: Vec<usize> = text[startxref..]
            .lines()
            .skip(3)
            .take(5)
            .map(|line| line[..10].parse().unwrap())
            .collect();
        for (index, offset) in entries.iter().enumerate() {
            let header = format!("{} 0 obj\n", index + 1);
            assert!(text[*offset..].starts_with(&header), "object {}", index + 1);
        }
    }

    #[test]
    fn stream_length_matches_content() {
        let text = String::from_utf8(build_text_pdf(&["a", "b"])).unwrap();
        let length: usize = text
            .split("/Length ")
            .nth(1)
            .and_then(|tail| tail.split(' ').next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        let start = text.find("stream\n").unwrap() + "stream\n".len();
        let end = text.find("endstream").unwrap();
        assert_eq!(end - start, length);
    }

    #[test]
    fn escapes_string_delimiters() {
        assert_eq!(escape_text(r"Rate (peak) \ day"), r"Rate \(peak\) \\ day");
        assert_eq!(escape_text("caf\u{e9}\ttab"), "caftab");
    }

    #[test]
    fn fact_sheet_wording_fits_its_fuel() {
        for bpid in ["ORI2201GS", "ORI2201EE"] {
            let plan = find_plan(bpid).unwrap();
            let pdf = String::from_utf8(plan_fact_sheet(&plan)).unwrap();
            let shown: String = pdf
                .lines()
                .filter_map(|line| line.strip_suffix(") Tj"))
                .map(|line| line.trim_start_matches('('))
                .collect::<Vec<_>>()
                .join("\n");
            assert_eq!(classify(&shown), Some(plan.fuel), "{}", shown);
        }
    }
}
