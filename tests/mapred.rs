// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Full map/reduce job composition against the server's JSON shape.
use crmap::mapred::{Function, IndexQuery, MapReduce, Phase};
use serde_json::json;

#[test]
fn full_job_serializes_in_server_shape() {
    let job = MapReduce::new()
        .add("goog", "2010-04-12")
        .add("goog", "2010-04-13")
        .phase(Phase::map(Function::source(
            "function(value){ return [JSON.parse(value.values[0].data)]; }",
        )))
        .phase(
            Phase::reduce(Function::erlang("riak_kv_mapreduce", "reduce_sort")).keep(true),
        )
        .timeout(50_000);

    assert_eq!(
        job.to_json(),
        json!({
            "inputs": [["goog", "2010-04-12"], ["goog", "2010-04-13"]],
            "query": [
                { "map": {
                    "language": "javascript",
                    "source": "function(value){ return [JSON.parse(value.values[0].data)]; }",
                    "keep": false,
                }},
                { "reduce": {
                    "language": "erlang",
                    "module": "riak_kv_mapreduce",
                    "function": "reduce_sort",
                    "keep": true,
                }},
            ],
            "timeout": 50_000,
        }),
    );
}

#[test]
fn chained_builders_accumulate_phases_in_order() {
    let job = MapReduce::new()
        .bucket("docs")
        .map("Riak.mapValues")
        .link(Some("people".to_string()), None)
        .reduce("Riak.reduceSum");

    let query = job.to_json()["query"].clone();
    assert!(query[0].get("map").is_some());
    assert!(query[1].get("link").is_some());
    assert!(query[2].get("reduce").is_some());
    assert_eq!(query[1]["link"]["bucket"], json!("people"));
    assert_eq!(query[1]["link"]["tag"], json!("_"));
}

#[test]
fn secondary_index_inputs_replace_earlier_ones() {
    let job = MapReduce::new()
        .add("foo", "bar")
        .index("users", "age_int", IndexQuery::range(21, 65).unwrap());

    assert_eq!(
        job.to_json()["inputs"],
        json!({ "bucket": "users", "index": "age_int", "start": 21, "end": 65 }),
    );
}

#[test]
fn escaped_inputs_reach_the_job_body() {
    let job = MapReduce::new().add("[foo]", "(bar)");
    assert_eq!(
        job.to_json()["inputs"],
        json!([["%5Bfoo%5D", "%28bar%29"]]),
    );
}
