use nics_geometry::{
    buffer::{self, BufferError},
    circle, coordinates, crs, mgrs, nearest, spherical, well_known_text, Coordinate, MarkupType,
    Vector2,
};

#[test]
fn wkt_round_trips_for_each_shape_kind() {
    let path = vec![
        Coordinate::new(34.0, -118.0),
        Coordinate::new(34.1, -118.1),
        Coordinate::new(34.0, -118.2),
    ];

    for markup in [MarkupType::Marker, MarkupType::Sketch] {
        let wkt = well_known_text::to_wkt(&path, markup).unwrap();
        let parsed = well_known_text::coordinates_from_wkt(&wkt).unwrap();
        let expected = if markup == MarkupType::Marker { &path[..1] } else { &path[..] };
        assert_eq!(parsed, expected);
    }

    let wkt = well_known_text::to_wkt(&path, MarkupType::Polygon).unwrap();
    let parsed = well_known_text::coordinates_from_wkt(&wkt).unwrap();
    assert_eq!(&parsed[..3], &path[..]);
    assert_eq!(parsed[3], path[0]);
}

#[test]
fn buffered_wkt_measures_larger_than_source() {
    let square = "POLYGON((-118.3 34.0, -118.29 34.0, -118.29 34.01, -118.3 34.01, -118.3 34.0))";
    let source = spherical::area(&well_known_text::coordinates_from_wkt(square).unwrap());

    let outline = buffer::buffer_wkt(square, 200.0).unwrap();
    let buffered = spherical::area(&outline.polygons[0][0]);
    assert!(buffered > source);

    let reparsed = well_known_text::coordinates_from_wkt(&outline.to_wkt().unwrap()).unwrap();
    assert_eq!(reparsed.len(), outline.polygons[0][0].len());

    assert!(matches!(
        buffer::buffer_wkt(square, -10_000.0),
        Err(BufferError::NullGeometry)
    ));
}

#[test]
fn projection_round_trip_through_web_mercator() {
    let origin = Coordinate::new(34.0522, -118.2437);
    let projected = crs::transform(crs::WGS84, crs::WEB_MERCATOR, origin).unwrap();
    assert!((projected.lon + 13_162_826.0).abs() < 5.0, "{projected:?}");

    let back = crs::transform(crs::WEB_MERCATOR, crs::WGS84, projected).unwrap();
    assert!((back.lat - origin.lat).abs() < 1e-9);
    assert!((back.lon - origin.lon).abs() < 1e-9);

    assert_eq!(crs::transform(crs::WGS84, crs::WGS84, origin).unwrap(), origin);
    assert!(crs::transform_points_or_none(crs::WGS84, 1234, &[Vector2::new(0.0, 0.0)]).is_none());
}

#[test]
fn text_inputs_agree_on_one_location() {
    let decimal = coordinates::parse_coordinate_pair("34.0536", "-118.2427").unwrap();
    let from_mgrs = mgrs::parse_mgrs("11S LT 85308 68795").unwrap();
    assert!(spherical::distance_between(decimal, from_mgrs) < 2.0);
    assert_eq!(mgrs::to_mgrs(decimal, 3).unwrap(), "11SLT853687");
}

#[test]
fn snapping_to_a_drawn_circle() {
    let center = Coordinate::new(34.0, -118.0);
    let ring = circle::circle_to_polygon(center, 1_000.0, 40);
    let hit = nearest::find_nearest_point(center, &ring, true).unwrap();
    // the chord midpoints sit slightly inside the radius
    assert!(hit.distance_m < 1_000.0 && hit.distance_m > 990.0, "{}", hit.distance_m);

    let outside = spherical::offset(center, 1_500.0, 90.0);
    let snapped = nearest::find_nearest_point(outside, &ring, true).unwrap();
    assert!((snapped.distance_m - 500.0).abs() < 5.0, "{}", snapped.distance_m);
}
