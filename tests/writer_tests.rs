use std::fs;

use filmow_export::writer::write_table;
use filmow_export::*;
use tempfile::tempdir;

const HEADER: &str = "Title,Year,Directors,Rating,Runtime,Review,Title Type,URL\n";

#[test]
fn test_output_file_names() {
    assert_eq!(output_file_name("watched", "joana", TitleFilter::All), "watched_joana.csv");
    assert_eq!(
        output_file_name("favorites", "joana", TitleFilter::Series),
        "favorites_joana_series.csv"
    );
    assert_eq!(
        output_file_name("list", "top-l12", TitleFilter::Features),
        "list_top-l12_features.csv"
    );
    assert_eq!(
        output_file_name("watchlist", "joana", TitleFilter::Films),
        "watchlist_joana_films.csv"
    );
}

#[test]
fn test_fields_are_quoted_when_needed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let row = Row {
        title: "Crouching Tiger, \"Hidden\" Dragon".into(),
        year: "2000".into(),
        directors: "Ang Lee".into(),
        rating: "4.5".into(),
        runtime: "120".into(),
        review: String::new(),
        title_type: "film".into(),
        url: "https://filmow.com/o-tigre-t1/".into(),
    };

    write_table(&path, &[row]).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        format!(
            "{HEADER}\"Crouching Tiger, \"\"Hidden\"\" Dragon\",2000,Ang Lee,4.5,120,,film,https://filmow.com/o-tigre-t1/\n"
        )
    );
}

#[test]
fn test_header_written_without_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");

    write_table(&path, &[]).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), HEADER);
}

#[test]
fn test_table_writer_paths() {
    let dir = tempdir().unwrap();
    let writer = TableWriter::new(dir.path(), "joana", TitleFilter::Shorts);

    let path = writer.write("watched", &[]).unwrap();

    assert_eq!(path, dir.path().join("watched_joana_shorts.csv"));
    assert!(path.is_file());
}

#[test]
fn test_unwritable_path_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("out.csv");

    let result = write_table(&path, &[]);

    match result {
        Err(err @ ExportError::Csv { .. }) => assert_eq!(err.exit_code(), 4),
        _ => panic!("Expected Csv error"),
    }
}
