//! Synthetic raw tables shaped like the real company/shuttle/review data.

use crate::data::{Cell, Table};

/// Four companies with percent ratings and t/f IATA flags.
pub fn raw_companies() -> Table {
    let ratings = ["100%", "67%", "85%", "90%"];
    let iata = ["t", "f", "t", "t"];

    let rows = (0..4)
        .map(|i| {
            vec![
                Cell::Float((i + 1) as f64),
                Cell::Str(ratings[i].to_string()),
                Cell::Str(iata[i].to_string()),
            ]
        })
        .collect();
    table(&["id", "company_rating", "iata_approved"], rows)
}

/// Sixteen shuttles with money-formatted prices that are exactly linear in
/// engines, passenger capacity and crew.
pub fn raw_shuttles() -> Table {
    let types = ["Type F5", "Type V5"];
    let rows = (0..16)
        .map(|i| {
            let engines = (1 + i % 4) as f64;
            let capacity = (2 + 3 * ((i / 4) % 4)) as f64;
            let crew = (1 + i % 5) as f64;
            let price = 100.0 + 10.0 * engines + 5.0 * capacity + 2.0 * crew;
            vec![
                Cell::Float((i + 1) as f64),
                Cell::Float((1 + i % 4) as f64),
                Cell::Str(types[i % 2].to_string()),
                Cell::Float(engines),
                Cell::Float(capacity),
                Cell::Float(crew),
                Cell::Str(if i % 2 == 0 { "t" } else { "f" }.to_string()),
                Cell::Str("t".to_string()),
                Cell::Str(format!("${price:.1}")),
            ]
        })
        .collect();
    table(
        &[
            "id",
            "company_id",
            "shuttle_type",
            "engines",
            "passenger_capacity",
            "crew",
            "d_check_complete",
            "moon_clearance_complete",
            "price",
        ],
        rows,
    )
}

/// Reviews for shuttles 1..=14; shuttle 13's rating is null so the join
/// output still contains something for `drop_nulls` to remove.
pub fn raw_reviews() -> Table {
    let rows = (0..14)
        .map(|i| {
            let rating = if i == 12 {
                Cell::Null
            } else {
                Cell::Float(7.0 + (i % 3) as f64)
            };
            vec![Cell::Float((i + 1) as f64), rating]
        })
        .collect();
    table(&["shuttle_id", "review_scores_rating"], rows)
}

fn table(headers: &[&str], rows: Vec<Vec<Cell>>) -> Table {
    let headers = headers.iter().map(|h| h.to_string()).collect();
    match Table::from_rows(headers, rows) {
        Ok(t) => t,
        Err(e) => panic!("bad fixture: {e}"),
    }
}
