use kira_db_combine::names::{SanitizingNameSafety, safe_name, scan_illegal, split_ext};
use kira_db_combine::strain::normalize_strain;

#[test]
fn strain_names_are_safe() {
    let cases = [
        (
            "Streptomyces specialis GW41-1564/R2",
            "Streptomyces_specialis_GW41-1564_R2",
        ),
        (
            "Streptomyces coelicolor A3(2) R4-mCherry-17",
            "Streptomyces_coelicolor_A3_2_R4-mCherry-17",
        ),
        ("Streptomyces sp. TEST(s);678", "Streptomyces_sp._TEST_s_678"),
    ];
    for (raw, expected) in cases {
        assert_eq!(safe_name(raw), expected);
        assert_eq!(safe_name(expected), expected);
    }
}

#[test]
fn scan_pairs_unsafe_names_with_corrections() {
    let names = [
        "test1_.*)]{.faa.gz",
        "2tes_(t)_sp. a.fna.xz",
        "correct_name.fna.xz",
        "Correct.txt",
    ];
    let scan = scan_illegal(names, &SanitizingNameSafety).unwrap();

    let originals = scan
        .pairs
        .iter()
        .map(|pair| pair.original.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        originals,
        vec![
            "2tes_(t)_sp. a.fna.xz",
            "Correct.txt",
            "correct_name.fna.xz",
            "test1_.*)]{.faa.gz",
        ]
    );

    let corrections = scan.corrections().collect::<Vec<_>>();
    assert_eq!(
        corrections,
        vec![
            ("2tes_(t)_sp. a.fna.xz", "2tes_t_sp._a.fna.xz"),
            ("test1_.*)]{.faa.gz", "test1_._.faa.gz"),
        ]
    );
    assert_eq!(
        scan.render_lines(),
        vec![
            "File with illegal character: \"2tes_(t)_sp. a.fna.xz\" -> \"2tes_t_sp._a.fna.xz\"",
            "File with illegal character: \"test1_.*)]{.faa.gz\" -> \"test1_._.faa.gz\"",
            "",
        ]
    );
}

#[test]
fn clean_collection_reports_nothing_illegal() {
    let scan = scan_illegal(["a.fna.gz", "b.gbff.gz"], &SanitizingNameSafety).unwrap();
    assert_eq!(scan.corrections().count(), 0);
    assert_eq!(scan.render_lines(), vec!["No illegal characters found."]);
}

#[test]
fn split_keeps_every_character() {
    for name in [
        "Streptomyces_sp._TEST_s_678.fna.gz",
        "file.name.gbff",
        "noext",
        ".hidden.gz",
        "a..b.xz",
    ] {
        let (base, ext) = split_ext(name);
        assert_eq!(format!("{base}{ext}"), name);
    }
    assert_eq!(
        split_ext("Streptomyces_sp._TEST_s_678.fna.gz"),
        ("Streptomyces_sp._TEST_s_678", ".fna.gz")
    );
}

#[test]
fn strain_synonyms_collapse() {
    let cases = [
        ("MA-4680 = NBRC 14893 NBRC 14893", "MA-4680 NBRC 14893"),
        ("NBRC 14893 = NBRC 14893 NBRC 14893", "NBRC 14893"),
        ("MA-4680 = NBRC 14893 MA-4680", "MA-4680 NBRC 14893"),
        ("MA-4680", "MA-4680"),
        ("NBRC 14893 NBRC 14893", "NBRC 14893"),
        ("AKKAK", "AKKAK"),
        ("M1154/pAMX4/pGP1416", "M1154/pAMX4/pGP1416"),
        ("M1154 M1154", "M1154"),
        ("C34 = DSM 42122 = NRRL B-24963", "C34 DSM 42122 NRRL B-24963"),
        ("", ""),
    ];
    for (source, expected) in cases {
        assert_eq!(normalize_strain(source).unwrap(), expected, "{source:?}");
    }
}
