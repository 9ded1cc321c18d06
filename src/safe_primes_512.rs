// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! A pool of pre-generated 512-bit safe primes, all congruent to 3 mod 4.
//!
//! Generating safe primes takes long enough to make test runs miserable, so
//! tests draw from this list instead. These primes are public; never use them
//! outside of tests.

pub(crate) const SAFE_PRIMES: &[&str] = &[
    "d481d5acacaae16a88f0594cded205f23e22c1aa53f963d783aeca771fb8bac166571ce621d5061d6174d5ea9c29d794a0cc3dda8a5d7a72fafb57d3a937254b",
    "8cbb09fedf310ac3639a7a689334cd527d805a5d7e977466e5dae1301b43caadb1cc381fd40437d5e8d0cd48e3e062772360c4c7794cd180af395de9c41bac23",
    "b8d561b83ecbfe061004bc7130cca028a467f14b08b457ff934a923ab2983c599a361c398d3aa047317316c0052940b965b48cb5fe1f0100f930bb453071efb3",
    "dbd28f66094cea563fa5b237b84984634072be5ec74089ac4f1a53c84e4b9d0fb2fea2826fcff5a7e5ffea2d245ffc5b1d418e64ab1d8596b82fb12370336f1f",
    "b34df884da604524ba22d14cec5ed048f20634816bf30dde42a1787d0d83f1d53a5081e6cdb102a89f20943277c58761613ad927b865d5b19ace2aa348ab8803",
    "efa8e74bbaa2f3db93794e22448da29742eea04cee3f2168dad251bd55941ecf3fd7011c2981370499c3927828e736e14040913f79a3de9dc9001c7af31d945b",
    "e9203b3b64fcb4cef42aa8bc1a15fc743f6ec3507df900664d92ac03b0b6e8c9d124a33d32f7f9f25653fddc750005741ee9f2573bf56df5473b417c206245bf",
    "8de0c83aab2d719b0ced20f32a89fa13433f3836130f7eb4e0c7df26e7aa64527394300cd552a8a692e333648092c7e5060d63c46f7156a822c10763d27f9ce3",
    "f47b8322b18097958ae190124d18d3a5b65f0bb8c7968253c4282873e3c57e67353779bc7785c494ec8616fae5a402cad84fdf5336bfa58c100a01f3f6efa21b",
    "ed064c66849f3ea23af31156204c1938f93c799730f6e91ea56ccadf31a7cede798efdf07759309bcfe9ccffac54d98ebd808b7a337a1b318d4e9fb70ff8bd43",
];
