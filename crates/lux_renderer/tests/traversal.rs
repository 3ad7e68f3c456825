//! Linear and BVH traversal must find the same nearest object.

use lux_core::Object;
use lux_math::{Aabb, Ray, Vec3};
use lux_renderer::{leaf_bounds, Bvh, LinearTraversal, SplitStrategy, Traversal, TraversalStack};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_point(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

fn random_unit(rng: &mut StdRng) -> Vec3 {
    loop {
        let v = random_point(rng, 1.0);
        if v.length_squared() > 1e-3 && v.length_squared() <= 1.0 {
            return v.normalize();
        }
    }
}

fn random_scene(rng: &mut StdRng, count: usize) -> Vec<Object> {
    (0..count)
        .map(|_| {
            let c = random_point(rng, 10.0);
            match rng.gen_range(0..5) {
                0 => Object::sphere(c, rng.gen_range(0.2..1.5), 0),
                1 => Object::triangle(c, c + random_point(rng, 2.0), c + random_point(rng, 2.0), 0),
                2 => Object::cube(c, c + random_point(rng, 1.5), 0),
                3 => Object::disk(c, random_unit(rng), rng.gen_range(0.3..1.5), 0),
                _ => Object::plane(c, random_unit(rng), rng.gen_range(0.5..2.0), rng.gen_range(0.5..2.0), 0),
            }
        })
        .collect()
}

fn check_agreement(seed: u64, strategy: SplitStrategy) {
    let mut rng = StdRng::seed_from_u64(seed);
    let objects = random_scene(&mut rng, 60);
    let bvh = Bvh::build(&objects, strategy);

    let mut linear_stack = TraversalStack::new(LinearTraversal.stack_capacity());
    let mut bvh_stack = TraversalStack::new(bvh.stack_capacity());
    let mut hits = 0;

    for _ in 0..400 {
        let ray = Ray::new(random_point(&mut rng, 14.0), random_unit(&mut rng));

        let a = LinearTraversal
            .closest_hit(&objects, &ray, &mut linear_stack)
            .unwrap();
        let b = bvh.closest_hit(&objects, &ray, &mut bvh_stack).unwrap();

        match (a, b) {
            (None, None) => {}
            (Some(a), Some(b)) => {
                hits += 1;
                assert!(
                    (a.distance - b.distance).abs() < 1e-4,
                    "seed {seed}: distances differ {} vs {}",
                    a.distance,
                    b.distance
                );
                // Exact ties may resolve to different objects
                if (a.distance - b.distance).abs() > 1e-6 {
                    assert_eq!(a.object_id, b.object_id, "seed {seed}");
                }
            }
            (a, b) => panic!("seed {seed}: linear {a:?} vs bvh {b:?}"),
        }
    }

    assert!(hits > 0, "seed {seed}: no ray hit anything");
}

#[test]
fn test_linear_and_bvh_agree_median() {
    for seed in 0..5 {
        check_agreement(seed, SplitStrategy::Median);
    }
}

#[test]
fn test_linear_and_bvh_agree_surface_area() {
    for seed in 100..105 {
        check_agreement(seed, SplitStrategy::SurfaceArea);
    }
}

#[test]
fn test_root_bounds_equal_union_of_leaves() {
    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let objects = random_scene(&mut rng, 40);

        for strategy in [SplitStrategy::Median, SplitStrategy::SurfaceArea] {
            let bvh = Bvh::build(&objects, strategy);

            let mut union = Aabb::EMPTY;
            for node in bvh.nodes().iter().filter(|n| n.is_leaf()) {
                union.expand(&node.bounds);
            }
            let root = bvh.bounds();
            assert!((root.min - union.min).abs().max_element() < 1e-6);
            assert!((root.max - union.max).abs().max_element() < 1e-6);

            // Every interior box contains its children
            for node in bvh.nodes() {
                for child in node.children() {
                    assert!(node.bounds.contains(&bvh.nodes()[child].bounds));
                }
            }
        }
    }
}

#[test]
fn test_every_object_has_one_leaf() {
    let mut rng = StdRng::seed_from_u64(11);
    let objects = random_scene(&mut rng, 33);
    let bvh = Bvh::build(&objects, SplitStrategy::Median);

    let mut seen = vec![0; objects.len()];
    for node in bvh.nodes() {
        if let Some(object) = node.object() {
            seen[object] += 1;
            assert_eq!(node.bounds, leaf_bounds(&objects[object]));
        }
    }
    assert!(seen.iter().all(|&n| n == 1));
}

#[test]
fn test_leaf_bounds_contain_defining_points() {
    let mut rng = StdRng::seed_from_u64(5);
    for object in random_scene(&mut rng, 100) {
        let bounds = leaf_bounds(&object);
        match object.shape {
            lux_core::Shape::Triangle { vertices, .. } => {
                for v in vertices {
                    assert!(bounds.contains_point(v));
                }
            }
            lux_core::Shape::Cube { min, max } => {
                assert!(bounds.contains_point(min) && bounds.contains_point(max));
            }
            _ => assert!(bounds.contains_point(object.position())),
        }
    }
}
