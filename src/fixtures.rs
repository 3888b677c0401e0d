//! Shared test instances.

/// The 15-period, 8-product sample instance.
pub(crate) const SAMPLE: &str = "15
8
0 0 0 0 0 0 0 0 1 0 0 0 0 0 0
0 0 0 0 0 0 0 0 0 1 0 0 1 0 0
0 0 0 0 0 0 0 0 0 0 1 0 0 0 0
0 0 0 0 0 0 0 0 0 0 0 0 0 1 0
0 0 0 0 0 0 0 0 0 1 1 0 0 0 0
0 0 0 0 0 0 0 0 0 0 1 0 0 0 1
0 0 0 0 0 0 1 0 0 0 0 0 0 0 0
0 0 0 0 0 0 0 0 0 1 0 1 0 0 0
10
  0   78   86   93  120 12 155 20
165    0  193  213  178 12  90 20
214  170    0  190  185 12  40 20
178  177  185    0  196 12 155 66
201  199  215  190    0 12 155 20
201  100   88  190   14  0  75 70
 50  44   155  190   111 12 0  20
201  199  215  190   123 70 155 0
";

/// A small instance: 6 periods, 2 products, 4 items.
pub(crate) const SMALL: &str = "6
2
0 0 1 0 0 1
0 0 0 1 1 0
2
0 5
3 0
";

/// Loads one of the fixtures.
pub(crate) fn load(text: &str) -> crate::models::Instance {
    crate::loading::InstanceLoader::new()
        .from_text(text)
        .expect("fixture loads")
}
