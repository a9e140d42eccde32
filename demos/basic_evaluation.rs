//! Basic evaluation example demonstrating core functionality.

use map_eval::{
    collect_detections, evaluate, metrics::iou::calculate_iou, parse_annotations, AdapterOptions,
    ApMethod, BoundingBox, ClassRegistry, DetectionFile, EvalOptions, Prediction,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== mAP Evaluation Example ===\n");

    // Example 1: IoU Calculation
    println!("1. IoU Calculation");
    let bbox1 = BoundingBox::new(10.0, 10.0, 60.0, 60.0);
    let bbox2 = BoundingBox::new(30.0, 30.0, 80.0, 80.0);
    let iou = calculate_iou(&bbox1, &bbox2);
    println!("   IoU between overlapping boxes: {:.4}", iou);
    println!();

    // Example 2: Class registry and annotations
    println!("2. Loading Annotations");
    let registry = ClassRegistry::parse("dock\nrobot\nperson\n")?;
    let annotations = parse_annotations(
        "images/0001.jpg 100,100,300,250,1 350,200,450,320,2\n\
         images/0002.jpg 50,60,120,200,2\n\
         images/0003.jpg\n",
        &registry,
    )?;
    println!("   Classes: {}", registry.len());
    println!("   Images: {}", annotations.len());
    println!("   Ground-truth boxes: {}", annotations.total_boxes());
    println!();

    // Example 3: Detections from a results file
    println!("3. Evaluating Detections From a File");
    let mut detector = DetectionFile::parse(
        "images/0001.jpg 105,98,298,255,1,0.92 352,210,449,318,2,0.81 0,0,40,40,0,0.35\n\
         images/0002.jpg 60,70,130,190,2,0.66\n\
         images/0003.jpg 10,10,50,50,2,0.12\n",
        AdapterOptions::default(),
    )?;
    let detections = collect_detections(&mut detector, &annotations, &registry)?;
    let report = evaluate(&registry, &annotations, &detections, &EvalOptions::default())?;
    print!("{}", report);
    println!();

    // Example 4: Any closure can act as the detector
    println!("4. Closure Detector With 101-Point Interpolation");
    let mut detector = |image_id: &str| -> map_eval::Result<Vec<Prediction>> {
        Ok(match image_id {
            "images/0001.jpg" => vec![
                Prediction::new(1, BoundingBox::new(100.0, 100.0, 300.0, 250.0), 0.9),
                Prediction::new(2, BoundingBox::new(0.0, 0.0, 20.0, 20.0), 0.8),
            ],
            "images/0002.jpg" => vec![Prediction::new(2, BoundingBox::new(50.0, 60.0, 120.0, 200.0), 0.7)],
            _ => Vec::new(),
        })
    };
    let detections = collect_detections(&mut detector, &annotations, &registry)?;
    let options = EvalOptions::default().with_ap_method(ApMethod::Interpolated101);
    let report = evaluate(&registry, &annotations, &detections, &options)?;
    for result in &report.per_class {
        match result.ap {
            Some(ap) => println!("   AP for {} = {:.4}", result.class_name, ap),
            None => println!("   AP for {} = excluded (no ground truth)", result.class_name),
        }
    }
    println!("   mAP: {:.4}", report.mean);
    println!();

    // Example 5: Sweep the IoU threshold
    println!("5. mAP Across IoU Thresholds");
    for threshold in [0.5, 0.75, 0.9] {
        let options = EvalOptions::default().with_iou_threshold(threshold);
        let report = evaluate(&registry, &annotations, &detections, &options)?;
        println!("   mAP@{:.2} = {:.4}", threshold, report.mean);
    }

    Ok(())
}
