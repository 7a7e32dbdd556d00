//! End-to-end import tests exercising the drivers, the model, and the
//! dumpers together.

use std::io::Write as _;

use gridstream::{
    create_filter, detect, CellPosition, CsvImportConfig, FilterConfig, Format, ImportFactory,
    JsonMapImporter,
};
use gridstream_core::formula::eval::{evaluate_named_expression, Value};
use gridstream_core::types::{FormulaGrammar, RangeSize, SrcAddress};
use gridstream_core::utils::constants::DEFAULT_SHEET_SIZE;
use gridstream_core::Document;
use pretty_assertions::assert_eq;

fn import_csv(content: &[u8], size: RangeSize, config: FilterConfig) -> Document {
    let mut doc = Document::new(size);
    {
        let factory = ImportFactory::new(&mut doc);
        let mut filter = create_filter(Format::Csv, factory, config).unwrap();
        filter.read_stream(content).unwrap();
    }
    doc
}

fn check_dump(doc: &Document) -> String {
    let mut out = Vec::new();
    doc.dump_check(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_csv_import_check_dump() {
    let doc = import_csv(
        b"name,score\nalice,10\nbob,20.5\nyes,true\n",
        DEFAULT_SHEET_SIZE,
        FilterConfig::default(),
    );
    assert_eq!(
        check_dump(&doc),
        "data/0/0:string:name\n\
         data/0/1:string:score\n\
         data/1/0:string:alice\n\
         data/1/1:numeric:10\n\
         data/2/0:string:bob\n\
         data/2/1:numeric:20.5\n\
         data/3/0:string:yes\n\
         data/3/1:boolean:true\n"
    );
}

#[test]
fn test_csv_round_trip_preserves_check_dump() {
    let input = b"a,\"b\"\"c\",d\n1,2.5,true\nx,,z\n";
    let doc = import_csv(input, DEFAULT_SHEET_SIZE, FilterConfig::default());
    let control = check_dump(&doc);

    // Dump the first sheet as CSV and re-import the dumped stream.
    let mut csv_out = Vec::new();
    gridstream_core::dump::csv::dump_sheet(&doc, 0, &mut csv_out).unwrap();
    let doc2 = import_csv(&csv_out, DEFAULT_SHEET_SIZE, FilterConfig::default());

    assert_eq!(check_dump(&doc2), control);
}

#[test]
fn test_csv_split_into_three_sheets() {
    // 25 rows against an 11-row sheet with one replicated header row.
    let mut content = String::from("h1,h2\n");
    for i in 1..25 {
        content.push_str(&format!("r{i},{i}\n"));
    }
    let config = FilterConfig {
        csv: CsvImportConfig {
            header_row_size: 1,
            split_to_multiple_sheets: true,
        },
        ..FilterConfig::default()
    };
    let doc = import_csv(
        content.as_bytes(),
        RangeSize {
            rows: 11,
            columns: 4,
        },
        config,
    );

    assert_eq!(doc.sheet_count(), 3);
    for idx in [1, 2] {
        let sheet = doc.sheet(idx).unwrap();
        let id = sheet.get_string_identifier(0, 0).unwrap();
        assert_eq!(doc.shared_strings().get(id), Some("h1"));
    }
}

#[test]
fn test_csv_premature_end_error_offset() {
    let mut doc = Document::new(DEFAULT_SHEET_SIZE);
    let factory = ImportFactory::new(&mut doc);
    let mut filter = create_filter(Format::Csv, factory, FilterConfig::default()).unwrap();
    let err = filter.read_stream(b"a,\"unterminated").unwrap_err();
    assert_eq!(
        err.to_string(),
        "parse error: stream ended prematurely while parsing quoted cell (offset: 15)"
    );
}

#[test]
fn test_json_root_value_rejected() {
    let mut doc = Document::new(DEFAULT_SHEET_SIZE);
    let factory = ImportFactory::new(&mut doc);
    let mut importer = JsonMapImporter::new(factory);
    importer.append_sheet("out").unwrap();
    importer
        .set_cell_link("$[0]", CellPosition::new("out", 0, 0))
        .unwrap();
    let err = importer.read_stream(b"42").unwrap_err();
    assert!(err
        .to_string()
        .contains("either '[' or '{' was expected"));
}

#[test]
fn test_shared_formula_recalculation() {
    let mut doc = Document::new(DEFAULT_SHEET_SIZE);
    {
        let mut factory = ImportFactory::new(&mut doc);
        factory.set_recalc_formula_cells(true);

        let mut sheet = factory.append_sheet(0, "Sheet1").unwrap();
        sheet.set_value(0, 1, 1.0); // B1
        sheet.set_value(0, 2, 2.0); // C1
        sheet.set_value(1, 1, 10.0); // B2
        sheet.set_value(1, 2, 20.0); // C2

        // A1 defines shared group 0 with its expression.
        let mut f = sheet.formula();
        f.set_position(0, 0);
        f.set_formula(FormulaGrammar::Xlsx, "B1+C1");
        f.set_shared_formula_index(0);
        f.commit().unwrap();

        // A2 joins the group by index only.
        let mut f = sheet.formula();
        f.set_position(1, 0);
        f.set_shared_formula_index(0);
        f.commit().unwrap();
        drop(sheet);

        factory.finalize().unwrap();
    }
    let sheet = doc.sheet(0).unwrap();
    assert_eq!(sheet.get_numeric_value(0, 0), Some(3.0));
    assert_eq!(sheet.get_numeric_value(1, 0), Some(30.0));
}

#[test]
fn test_named_expression_resolution() {
    let mut doc = Document::new(DEFAULT_SHEET_SIZE);
    {
        let mut factory = ImportFactory::new(&mut doc);
        let mut sheet = factory.append_sheet(0, "Sheet1").unwrap();
        sheet.set_value(1, 1, 100.0); // B2
        sheet.set_value(1, 2, 40.0); // C2
        drop(sheet);

        let mut ne = factory.named_expression();
        ne.set_base_position(SrcAddress::new(0, 0, 0));
        ne.set_named_expression("PROFIT", "Sheet1!$B$2-Sheet1!$C$2");
        ne.commit().unwrap();
    }
    let value = evaluate_named_expression(&doc, "PROFIT", SrcAddress::new(0, 0, 0)).unwrap();
    assert_eq!(value, Value::Number(60.0));
}

#[test]
fn test_read_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"x,y\n1,2\n").unwrap();

    let mut doc = Document::new(DEFAULT_SHEET_SIZE);
    {
        let factory = ImportFactory::new(&mut doc);
        let mut filter = create_filter(Format::Csv, factory, FilterConfig::default()).unwrap();
        filter.read_file(file.path()).unwrap();
    }
    assert_eq!(doc.sheet(0).unwrap().get_numeric_value(1, 0), Some(1.0));
}

#[test]
fn test_dump_files_per_sheet() {
    let doc = import_csv(b"a,1\nb,2\n", DEFAULT_SHEET_SIZE, FilterConfig::default());
    let outdir = tempfile::tempdir().unwrap();

    for format in [
        gridstream::DumpFormat::Csv,
        gridstream::DumpFormat::Flat,
        gridstream::DumpFormat::Html,
        gridstream::DumpFormat::Json,
    ] {
        doc.dump(format, outdir.path()).unwrap();
    }
    for name in ["data.csv", "data.txt", "data.html", "data.json"] {
        assert!(outdir.path().join(name).exists(), "missing {name}");
    }
}

#[test]
fn test_detection_end_to_end() {
    assert_eq!(detect(b"a,b\n1,2\n"), Format::Unknown);
    assert_eq!(
        detect(b"<?xml version=\"1.0\"?><Workbook/>"),
        Format::XlsXml
    );
    assert_eq!(detect(&[0x1f, 0x8b, 0x08, 0x00]), Format::Gnumeric);
}
