#[macro_use]
extern crate afl;

fn main() {
    fuzz!(|data: &[u8]| {
        nbt_flavors_fuzz::test(data);
    });
}
