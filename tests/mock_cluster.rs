//! Runs the topic source against librdkafka's in-process mock cluster.

use std::time::Duration;

use dispatcher_export::extractor::RecordExtractor;
use dispatcher_export::pipeline::export;
use dispatcher_export::sink::CsvSink;
use dispatcher_export::source::{KafkaSourceConfig, TopicSource};
use rdkafka::config::ClientConfig;
use rdkafka::mocking::MockCluster;
use rdkafka::producer::{BaseProducer, BaseRecord, Producer};

#[test]
fn test_unknown_topic_ends_on_idle_timeout() {
    let cluster = MockCluster::new(1).unwrap();
    let config = KafkaSourceConfig::new(&cluster.bootstrap_servers(), "does-not-exist")
        .with_idle_timeout(Duration::from_millis(3000));

    let source = TopicSource::connect(&config).unwrap();
    let items: Vec<_> = source.collect();

    assert!(items.is_empty(), "unexpected items: {:?}", items);
}

#[test]
fn test_drains_existing_topic_into_csv() {
    let cluster = MockCluster::new(1).unwrap();
    cluster.create_topic("requests", 1, 1).unwrap();

    let producer: BaseProducer = ClientConfig::new()
        .set("bootstrap.servers", cluster.bootstrap_servers())
        .create()
        .unwrap();
    for payload in [
        r#"{"requestHeader":{"type":"DISPATCHER","correlationId":"c1"},"requestBody":{"email":"x@y.com"}}"#,
        r#"{"requestHeader":{"type":"OTHER"},"requestBody":{"email":"z@q.com"}}"#,
    ] {
        producer
            .send(BaseRecord::<(), str>::to("requests").payload(payload))
            .unwrap();
    }
    producer.flush(Duration::from_secs(5)).unwrap();

    let config = KafkaSourceConfig::new(&cluster.bootstrap_servers(), "requests")
        .with_idle_timeout(Duration::from_millis(5000));
    let source = TopicSource::connect(&config).unwrap();

    let mut sink = CsvSink::new(Vec::new()).unwrap();
    let summary = export(source, &RecordExtractor::default(), &mut sink).unwrap();
    let output = String::from_utf8(sink.into_inner().unwrap()).unwrap();

    assert_eq!(summary.messages, 2);
    assert_eq!(
        output,
        "\"correlationId\",\"migrationRunId\",\"email\"\n\"c1\",\"\",\"x@y.com\"\n"
    );
}
