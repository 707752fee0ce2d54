use serde_json::json;

use super::*;
use crate::error::ProtocolError;

fn sample_settings() -> JobSettings {
    JobSettings {
        classification_type: ClassificationType::Abinit,
        mask_radius: "100".to_string(),
        high_res_initial: "40".to_string(),
        high_res_final: "8".to_string(),
        run_count_startup: "15".to_string(),
        run_count_refine: "5".to_string(),
        particle_count_initial: "15000".to_string(),
        particle_count_update: "50000".to_string(),
        class_number: "50".to_string(),
        particles_per_class: "300".to_string(),
        autocenter: true,
        automask: false,
        neural_net: None,
        pixel_size: None,
    }
}

#[test]
fn initialize_envelope_matches_wire_shape() {
    let encoded = serde_json::to_value(ClientCommand::Initialize {}).expect("encode");
    assert_eq!(encoded, json!({"command": "initialize", "data": {}}));
}

#[test]
fn kill_job_envelope_carries_fixed_payload() {
    let encoded = serde_json::to_value(ClientCommand::kill_job()).expect("encode");
    assert_eq!(encoded, json!({"command": "kill_job", "data": "Kill this job!"}));
}

#[test]
fn change_directory_envelope_carries_path() {
    let command = ClientCommand::ChangeDirectory("/data/run2".to_string());
    let encoded = serde_json::to_value(command).expect("encode");
    assert_eq!(
        encoded,
        json!({"command": "change_directory", "data": "/data/run2"})
    );
}

#[test]
fn get_gallery_envelope_carries_page_index() {
    let command = ClientCommand::GetGallery { gallery_number: 7 };
    let encoded = serde_json::to_value(command).expect("encode");
    assert_eq!(
        encoded,
        json!({"command": "get_gallery", "data": {"gallery_number": 7}})
    );
}

#[test]
fn start_job_envelope_carries_form_fields() {
    let encoded =
        serde_json::to_value(ClientCommand::StartJob(sample_settings())).expect("encode");
    assert_eq!(encoded["command"], "start_job");
    assert_eq!(encoded["data"]["classification_type"], "abinit");
    assert_eq!(encoded["data"]["mask_radius"], "100");
    assert_eq!(encoded["data"]["autocenter"], true);
    assert_eq!(encoded["data"]["automask"], false);
}

#[test]
fn listen_envelope_uses_listen_tag() {
    let encoded = serde_json::to_value(ClientCommand::Listen(sample_settings())).expect("encode");
    assert_eq!(encoded["command"], "listen");
}

#[test]
fn form_payload_strips_display_only_fields() {
    let mut synced = sample_settings();
    synced.neural_net = Some("BoxNet2_20180918".to_string());
    synced.pixel_size = Some(1.1);

    let payload = synced.form_payload();
    assert_eq!(payload.neural_net, None);
    assert_eq!(payload.pixel_size, None);
    assert_eq!(payload.mask_radius, synced.mask_radius);

    let encoded = serde_json::to_value(&payload).expect("encode");
    assert!(encoded.get("neural_net").is_none());
    assert!(encoded.get("pixel_size").is_none());
}

#[test]
fn decodes_init_with_full_snapshot() {
    let raw = json!({
        "type": "init",
        "settings": {
            "warp_folder": "/data/run1/",
            "job_status": "stopped",
            "settings": {
                "classification_type": "abinit",
                "mask_radius": "100",
                "high_res_initial": "40",
                "high_res_final": "8",
                "run_count_startup": "15",
                "run_count_refine": "5",
                "particle_count_initial": "15000",
                "particle_count_update": "50000",
                "class_number": "50",
                "particles_per_class": "300",
                "autocenter": true,
                "automask": false,
                "neural_net": "BoxNet2_20180918",
                "pixel_size": 1.1
            }
        },
        "gallery_data": "<div>classes</div>"
    })
    .to_string();

    let event = decode_server_event(&raw).expect("decode");
    let ServerEvent::Init {
        settings,
        gallery_data,
    } = event
    else {
        panic!("expected init, got {event:?}");
    };
    assert_eq!(settings.warp_folder, "/data/run1/");
    assert_eq!(settings.job_status, JobStatus::Stopped);
    assert!(!settings.force_abinit);
    assert_eq!(
        settings.settings.classification_type,
        ClassificationType::Abinit
    );
    assert_eq!(settings.settings.neural_net.as_deref(), Some("BoxNet2_20180918"));
    assert_eq!(gallery_data, "<div>classes</div>");
}

#[test]
fn decodes_payload_free_events() {
    assert_eq!(
        decode_server_event(r#"{"type":"job_started"}"#).expect("decode"),
        ServerEvent::JobStarted
    );
    assert_eq!(
        decode_server_event(r#"{"type":"job_finished"}"#).expect("decode"),
        ServerEvent::JobFinished
    );
    assert_eq!(
        decode_server_event(r#"{"type":"kill_received"}"#).expect("decode"),
        ServerEvent::KillReceived
    );
}

#[test]
fn decodes_alert_with_empty_string() {
    let event = decode_server_event(r#"{"type":"alert","data":""}"#).expect("decode");
    assert_eq!(
        event,
        ServerEvent::Alert {
            data: String::new()
        }
    );
}

#[test]
fn unknown_type_is_rejected_by_name() {
    let err = decode_server_event(r#"{"type":"reticulate","data":1}"#).expect_err("must reject");
    assert!(err.to_string().contains("reticulate"));
    match err {
        ProtocolError::UnknownType(tag) => assert_eq!(tag, "reticulate"),
        other => panic!("expected UnknownType, got {other:?}"),
    }
}

#[test]
fn missing_type_is_rejected() {
    let err = decode_server_event(r#"{"data":"orphan"}"#).expect_err("must reject");
    assert!(matches!(err, ProtocolError::MissingType));
}

#[test]
fn non_json_frame_is_rejected() {
    let err = decode_server_event("definitely not json").expect_err("must reject");
    assert!(matches!(err, ProtocolError::Json(_)));
}

#[test]
fn malformed_job_status_names_the_bad_value() {
    let raw = json!({
        "type": "settings_update",
        "settings": {
            "warp_folder": "/data/run1/",
            "job_status": "sideways",
            "settings": serde_json::to_value(sample_settings()).expect("encode")
        }
    })
    .to_string();

    let err = decode_server_event(&raw).expect_err("must reject");
    match err {
        ProtocolError::Payload { tag, source } => {
            assert_eq!(tag, "settings_update");
            assert!(source.to_string().contains("sideways"));
        }
        other => panic!("expected Payload, got {other:?}"),
    }
}
