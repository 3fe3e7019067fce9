// Copyright 2025 Cowboy AI, LLC.

//! Device commands and outbound messaging over a live NATS server

use futures::StreamExt;
use smart_agri_core::command_channel::{command_topic, DeviceCommandChannel, IrrigationCommand};
use smart_agri_core::notification::{NatsMessaging, SmsSender};
use smart_agri_core::{NatsCommandChannel, NatsConfig, ScheduleId};
use std::time::Duration;

#[tokio::test]
#[ignore] // Requires NATS server to be running
async fn test_start_command_round_trip() {
    let client = NatsConfig::default().connect().await.unwrap();
    let topic = command_topic("IT-VALVE-1");
    let mut subscriber = client.subscribe(topic.clone()).await.unwrap();

    let channel = NatsCommandChannel::new(client.clone());
    let command = IrrigationCommand::start(ScheduleId::new(), 35);
    channel.publish(&topic, &command).await.unwrap();
    client.flush().await.unwrap();

    let message = tokio::time::timeout(Duration::from_secs(2), subscriber.next())
        .await
        .unwrap()
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&message.payload).unwrap();
    assert_eq!(body["action"], "start");
    assert_eq!(body["durationMinutes"], 35);
}

#[tokio::test]
#[ignore] // Requires NATS server to be running
async fn test_sms_handed_to_outbound_subject() {
    let client = NatsConfig::default().connect().await.unwrap();
    let mut subscriber = client.subscribe("smart-agri.outbound.sms").await.unwrap();

    NatsMessaging::new(client.clone())
        .send_sms("+919822222222", "[Smart Agri] Test: hello")
        .await
        .unwrap();

    let message = tokio::time::timeout(Duration::from_secs(2), subscriber.next())
        .await
        .unwrap()
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&message.payload).unwrap();
    assert_eq!(body["phone"], "+919822222222");
}
