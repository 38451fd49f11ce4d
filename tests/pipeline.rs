use std::fs;

use astra_bouquet::bouquet::parse_bouquet;
use astra_bouquet::settings::AnalysisSettings;
use astra_bouquet::{
    AnalysisLogParser, BouquetCategory, BouquetStore, ConfigParser, ConfigStore, MergeOutcome, MergeRequest,
    NoReload, Pipeline, TuningContext, select_block,
};
use tempfile::TempDir;

const ASTRA_CONF: &str = r#"
-- generated by hand
decapA = make_t2mi_decap({
    name = "Ch1",
    input = "http://127.0.0.1:8001/1:0:1:1:2:3:0:0:0:0:",
    plp = 0,
    pid = 4095,
})

make_channel({
    name = "out1",
    input = { "t2mi://decapA", },
    output = { "http://0.0.0.0:9999/out1", },
})
"#;

const LOG: &str = "\
INFO: sid: 101
INFO: Service: Channel One
INFO: Provider: ProvX
";

fn pipeline(dir: &TempDir) -> Pipeline {
    Pipeline::new(
        AnalysisLogParser::new(&AnalysisSettings::default()).unwrap(),
        BouquetStore::new(dir.path()),
        Box::new(NoReload),
    )
}

#[tokio::test]
async fn test_decap_block_to_bouquet() {
    let temp_dir = TempDir::new().unwrap();
    let conf = ConfigStore::new(temp_dir.path().join("astra.conf"));
    conf.save(ASTRA_CONF).unwrap();

    let parsed = conf.parse(&ConfigParser::default()).unwrap();
    let block = &parsed.decap_routed["decapA"];
    assert_eq!(block.marker_id, "4095");
    assert!(block.output_url.ends_with("/out1"));

    let selection = select_block(&conf, &ConfigParser::default(), "4095 - Ch1").unwrap().unwrap();
    assert_eq!(selection.category, BouquetCategory::T2mi);

    let outcome = pipeline(&temp_dir)
        .merge(MergeRequest {
            selection,
            log_text: LOG.to_string(),
            tuning: TuningContext::default(),
        })
        .await
        .unwrap();
    let MergeOutcome::Written(summary) = outcome else { panic!("expected a write") };
    assert_eq!(summary.records_written, 1);

    let file = BouquetStore::new(temp_dir.path()).load(BouquetCategory::T2mi);
    assert_eq!(file.records.len(), 1);
    assert_eq!(file.records[0].service_id, 101);
    assert_eq!(file.records[0].marker_id, "4095");
    assert_eq!(file.headers.keys().collect::<Vec<_>>(), vec!["4095"]);
}

#[tokio::test]
async fn test_repeated_merge_is_stable_and_indexed_once() {
    let temp_dir = TempDir::new().unwrap();
    let conf = ConfigStore::new(temp_dir.path().join("astra.conf"));
    conf.save(ASTRA_CONF).unwrap();
    let tuning = TuningContext {
        satellite_label: "Eutelsat 4.8E".into(),
        frequency_mhz: 11747,
    };

    let mut texts = Vec::new();
    for _ in 0..2 {
        let selection = select_block(&conf, &ConfigParser::default(), "decapA").unwrap().unwrap();
        pipeline(&temp_dir)
            .merge(MergeRequest {
                selection,
                log_text: LOG.to_string(),
                tuning: tuning.clone(),
            })
            .await
            .unwrap();
        texts.push(fs::read_to_string(temp_dir.path().join("userbouquet.ciefp_t2mi.tv")).unwrap());
    }
    assert_eq!(texts[0], texts[1]);
    assert_eq!(
        texts[0],
        "#NAME T2MI\n\
         #SERVICE 1:64:1:0:0:0:0:0:0:0::Eutelsat 4.8E T2MI 4095\n\
         #DESCRIPTION Eutelsat 4.8E T2MI 4095\n\
         #SERVICE 1:0:1:65:2DE3:FFF:0:0:0:0:http%3a//0.0.0.0%3a9999/out1:Channel One - TV (4095)\n\
         #DESCRIPTION Channel One - TV (4095)\n"
    );

    let index = fs::read_to_string(temp_dir.path().join("bouquets.tv")).unwrap();
    assert_eq!(index.matches("FROM BOUQUET \"userbouquet.ciefp_t2mi.tv\"").count(), 1);

    let parsed = parse_bouquet(&texts[1]);
    assert_eq!(parsed.records.len(), 1);
}

#[test]
fn test_config_without_blocks_selects_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let conf = ConfigStore::new(temp_dir.path().join("missing.conf"));
    assert!(conf.parse(&ConfigParser::default()).unwrap().is_empty());
    assert!(select_block(&conf, &ConfigParser::default(), "4095 - Ch1").unwrap().is_none());
}

#[tokio::test]
async fn test_unnamed_service_merged_once() {
    let temp_dir = TempDir::new().unwrap();
    let conf = ConfigStore::new(temp_dir.path().join("astra.conf"));
    conf.save(ASTRA_CONF).unwrap();

    for log in ["INFO: sid: 101\nINFO: Service: \nINFO: Provider: X\n", "INFO: sid: 101\nINFO: Service: \"\"\nINFO: Provider: X\n"] {
        for _ in 0..3 {
            let selection = select_block(&conf, &ConfigParser::default(), "decapA").unwrap().unwrap();
            pipeline(&temp_dir)
                .merge(MergeRequest {
                    selection,
                    log_text: log.to_string(),
                    tuning: TuningContext::default(),
                })
                .await
                .unwrap();
        }
    }

    let file = BouquetStore::new(temp_dir.path()).load(BouquetCategory::T2mi);
    assert_eq!(file.records.len(), 1);
    assert_eq!(file.records[0].display_label, "SID 101 - TV (4095)");
}
