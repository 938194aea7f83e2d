//! End-to-end tests for the locate -> map -> apply pipeline, driven
//! through files the way the editorial workflow runs it.

use apostil_core::{
    apply::NoteApplier,
    config::{LocatorSettings, MatcherSettings},
    locate::{self, NoteLocator},
    matcher::{self, NoteMatcher},
    report,
    tei::{backup_path, TeiDocument},
};
use std::fs;
use std::path::Path;

const EDITION_PAGE_ONE: &str = r##"<html><body><table><tr>
<td>Sale el gran Maestre<sup><a href="#n1">1</a></sup> de Calatrava</td>
</tr><tr>
<td>Fernando es el Rey<sup><a href="#n2">2</a></sup> de Castilla</td>
</tr></table></body></html>"##;

const EDITION_PAGE_TWO: &str = r##"<html><body>
<p>donde reina el amor<sup><a href="#n3">3</a></sup></p>
<p>habla el Comendador<sup><a href="#n4">4</a></sup> mayor</p>
</body></html>"##;

const PLAY: &str = r##"<TEI xmlns="http://www.tei-c.org/ns/1.0">
<text><body><div type="act" n="1"><sp who="#flores">
<speaker>FLORES</speaker>
<l n="1">Sale el gran Maestre de Calatrava</l>
<l n="2">Fernando es el <seg>Rey</seg> de Castilla</l>
<l n="3">donde reina el amor primero</l>
<l n="4">y la villa manda despues</l>
</sp></div></body></text>
</TEI>"##;

fn write_fixture(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let html_dir = dir.join("html");
    fs::create_dir(&html_dir).unwrap();
    fs::write(html_dir.join("01_acto_primero.html"), EDITION_PAGE_ONE).unwrap();
    fs::write(html_dir.join("02_acto_segundo.html"), EDITION_PAGE_TWO).unwrap();

    let target = dir.join("fuenteovejuna.xml");
    fs::write(&target, PLAY).unwrap();
    (html_dir, target)
}

#[test]
fn full_pipeline_inserts_markers_and_reports_the_rest() {
    let tmp = tempfile::tempdir().unwrap();
    let (html_dir, target) = write_fixture(tmp.path());
    let positions = tmp.path().join("posiciones_notas.json");
    let mapping_path = tmp.path().join("mapeo_notas.json");
    let report_path = tmp.path().join("notas_revision_manual.csv");

    // Stage 1
    let extracted = NoteLocator::new(LocatorSettings::default())
        .extract_dir(&html_dir)
        .unwrap();
    assert_eq!(extracted.records.len(), 4);
    assert!(extracted.failed_documents.is_empty());
    locate::write_records(&positions, &extracted.records).unwrap();

    // Stage 2
    let records = locate::read_records(&positions).unwrap();
    let doc = TeiDocument::load(&target).unwrap();
    let mapping = NoteMatcher::new(MatcherSettings::default()).match_notes(&records, &doc);
    assert_eq!(mapping.total(), records.len());
    // Notes 1 through 3 resolve; note 4 has no "Comendador" line at all.
    assert!(mapping.resolved.iter().any(|r| r.number == 1 && r.line_number == "1"));
    assert!(mapping.resolved.iter().any(|r| r.number == 2 && r.line_number == "2"));
    assert!(mapping.resolved.iter().any(|r| r.number == 3 && r.line_number == "3"));
    assert_eq!(mapping.unresolved.len(), 1);
    assert_eq!(mapping.unresolved[0].number, 4);
    matcher::write_mapping(&mapping_path, &mapping).unwrap();

    // Stage 3
    let mapping = matcher::read_mapping(&mapping_path).unwrap();
    let original = fs::read_to_string(&target).unwrap();
    let outcome = NoteApplier::new().apply_file(&target, &mapping).unwrap();
    report::write_review_report(&report_path, &mapping, &outcome.failures()).unwrap();

    assert_eq!(outcome.inserted(), 3);
    assert!(outcome.failures().is_empty());

    // Backup holds the pre-mutation document.
    let backup = backup_path(&target);
    assert!(backup.exists());
    assert_eq!(fs::read_to_string(&backup).unwrap(), original);

    let annotated = fs::read_to_string(&target).unwrap();
    assert!(annotated.contains("Maestre{1} de Calatrava"));
    assert!(annotated.contains("<seg>Rey{2}</seg>"));
    assert!(annotated.contains("amor{3} primero"));

    let review = fs::read_to_string(&report_path).unwrap();
    assert!(review.starts_with("Número Nota,Tipo Problema,Palabra,Contexto,Candidatos/Motivo"));
    assert!(review.contains("4,No encontrada,Comendador"));
}

#[test]
fn rerunning_apply_never_double_inserts() {
    let tmp = tempfile::tempdir().unwrap();
    let (html_dir, target) = write_fixture(tmp.path());

    let extracted = NoteLocator::new(LocatorSettings::default())
        .extract_dir(&html_dir)
        .unwrap();
    let doc = TeiDocument::load(&target).unwrap();
    let mapping = NoteMatcher::new(MatcherSettings::default()).match_notes(&extracted.records, &doc);

    let applier = NoteApplier::new();
    let first = applier.apply_file(&target, &mapping).unwrap();
    let after_first = fs::read_to_string(&target).unwrap();

    let second = applier.apply_file(&target, &mapping).unwrap();
    let after_second = fs::read_to_string(&target).unwrap();

    assert_eq!(first.inserted(), 3);
    assert_eq!(second.inserted(), 0);
    assert_eq!(second.already_marked(), 3);
    assert_eq!(after_first, after_second);
}

#[test]
fn unreadable_directory_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("no_such_dir");
    let result = NoteLocator::new(LocatorSettings::default()).extract_dir(&missing);
    assert!(result.is_err());
}

#[test]
fn directory_without_html_documents_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("readme.txt"), "nothing here").unwrap();
    let result = NoteLocator::new(LocatorSettings::default()).extract_dir(tmp.path());
    assert!(result.is_err());
}

#[test]
fn malformed_target_document_is_fatal_before_mutation() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("broken.xml");
    fs::write(&target, "<TEI><unclosed>").unwrap();

    let mapping = apostil_core::NoteMapping::default();
    let result = NoteApplier::new().apply_file(&target, &mapping);
    assert!(result.is_err());
    // The checkpoint copy is made before parsing; the target itself is
    // untouched.
    assert_eq!(fs::read_to_string(&target).unwrap(), "<TEI><unclosed>");
}
