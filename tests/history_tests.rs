use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};

use dorkscope::history::{HistoryFilter, HistoryTable, is_within_days};

const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<table id="historyTable" class="table">
  <thead><tr><th></th><th>Query</th><th>Type</th><th>Date</th><th>Results</th></tr></thead>
  <tbody>
    <tr data-type="domain" data-status="completed" data-date="2024-03-09T08:00:00Z">
      <td><input type="checkbox" class="row-select"></td><td>example.com</td><td>domain</td><td>2024-03-09</td><td>14</td>
    </tr>
    <tr data-type="email" data-status="failed" data-date="2024-02-20 12:00:00">
      <td><input type="checkbox" class="row-select" checked></td><td>admin@example.com</td><td>email</td><td>2024-02-20</td><td>0</td>
    </tr>
    <tr data-type="person" data-status="completed" data-date="not a date">
      <td><input type="checkbox" class="row-select"></td><td>Ada Lovelace</td><td>person</td><td>?</td><td>3</td>
    </tr>
  </tbody>
</table>
</body></html>"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
}

fn visible_queries(table: &HistoryTable) -> Vec<String> {
    table
        .visible_rows()
        .filter_map(|row| row.cell(1).map(str::to_string))
        .collect()
}

mod parsing {
    use super::*;

    #[test]
    fn test_reads_rows_attributes_and_checkboxes() -> Result<()> {
        let table = HistoryTable::parse(PAGE)?;
        assert_eq!(table.rows().len(), 3);

        let first = &table.rows()[0];
        assert_eq!(first.search_type(), Some("domain"));
        assert_eq!(first.status(), Some("completed"));
        assert_eq!(first.cell(4), Some("14"));
        assert!(first.visible);
        assert_eq!(table.selected_count(), 1);
        Ok(())
    }

    #[test]
    fn test_page_without_table_is_an_error() {
        assert!(HistoryTable::parse("<html><body><p>nothing</p></body></html>").is_err());
    }

    #[test]
    fn test_header_rows_are_not_history_rows() -> Result<()> {
        let table = HistoryTable::parse(PAGE)?;
        assert!(table.rows().iter().all(|row| row.cell(1) != Some("Query")));
        Ok(())
    }
}

mod filtering {
    use super::*;

    #[test]
    fn test_type_filter() -> Result<()> {
        let mut table = HistoryTable::parse(PAGE)?;
        let shown = table.apply_filter(&HistoryFilter::from_inputs("email", "", "", ""), now());
        assert_eq!(shown, 1);
        assert_eq!(visible_queries(&table), vec!["admin@example.com"]);
        Ok(())
    }

    #[test]
    fn test_filters_combine() -> Result<()> {
        let mut table = HistoryTable::parse(PAGE)?;
        let filter = HistoryFilter::from_inputs("", "completed", "", "LOVELACE");
        assert_eq!(table.apply_filter(&filter, now()), 1);
        assert_eq!(visible_queries(&table), vec!["Ada Lovelace"]);
        Ok(())
    }

    #[test]
    fn test_date_range_skips_unparseable_dates() -> Result<()> {
        let mut table = HistoryTable::parse(PAGE)?;
        assert_eq!(
            table.apply_filter(&HistoryFilter::from_inputs("", "", "7", ""), now()),
            1
        );
        assert_eq!(visible_queries(&table), vec!["example.com"]);

        assert_eq!(
            table.apply_filter(&HistoryFilter::from_inputs("", "", "30", ""), now()),
            2
        );
        Ok(())
    }

    #[test]
    fn test_clearing_filters_shows_everything_again() -> Result<()> {
        let mut table = HistoryTable::parse(PAGE)?;
        table.apply_filter(&HistoryFilter::from_inputs("ip", "", "", ""), now());
        assert_eq!(table.visible_rows().count(), 0);
        assert_eq!(table.apply_filter(&HistoryFilter::default(), now()), 3);
        Ok(())
    }

    #[test]
    fn test_day_boundary_rounds_up() {
        let now = now();
        assert!(is_within_days("2024-03-09T12:00:00Z", 1, now));
        assert!(!is_within_days("2024-03-09T11:59:00Z", 1, now));
        assert!(!is_within_days("yesterday", 30, now));
    }
}

mod ordering {
    use super::*;

    #[test]
    fn test_sort_by_text_column() -> Result<()> {
        let mut table = HistoryTable::parse(PAGE)?;
        table.sort_by_column(1);
        let order: Vec<_> = table.rows().iter().filter_map(|r| r.cell(1)).collect();
        assert_eq!(order, vec!["Ada Lovelace", "admin@example.com", "example.com"]);
        Ok(())
    }

    #[test]
    fn test_sort_keeps_visibility() -> Result<()> {
        let mut table = HistoryTable::parse(PAGE)?;
        table.apply_filter(&HistoryFilter::from_inputs("domain", "", "", ""), now());
        table.sort_by_column(2);
        assert_eq!(table.rows().len(), 3);
        assert_eq!(visible_queries(&table), vec!["example.com"]);
        Ok(())
    }

    #[test]
    fn test_select_all_and_render() -> Result<()> {
        let mut table = HistoryTable::parse(PAGE)?;
        table.toggle_select_all(true);
        assert_eq!(table.selected_count(), 3);
        table.toggle_select_all(false);
        assert_eq!(table.selected_count(), 0);

        table.apply_filter(&HistoryFilter::from_inputs("person", "", "", ""), now());
        let html = table.render_rows();
        assert_eq!(html.matches(r#"style="display:none""#).count(), 2);
        assert!(html.contains(r#"data-type="person""#));

        // the rendered rows parse back to the same state
        let reparsed = HistoryTable::from_rows(&html)?;
        assert_eq!(visible_queries(&reparsed), vec!["Ada Lovelace"]);
        Ok(())
    }
}
