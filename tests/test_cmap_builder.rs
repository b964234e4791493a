//! Integration tests for the CMap builder against realistic CMap programs.

use postscript_oxide::cmap;
use postscript_oxide::object::Object;
use postscript_oxide::Interpreter;

/// A compact but structurally faithful CID CMap.
const CID_CMAP: &str = r#"%!PS-Adobe-3.0 Resource-CMap
%%DocumentNeededResources: ProcSet (CIDInit)
%%IncludeResource: ProcSet (CIDInit)
%%BeginResource: CMap (Demo-RKSJ-H)
%%Title: (Demo-RKSJ-H Adobe Japan1 6)
%%Version: 10.001
/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo 3 dict dup begin
  /Registry (Adobe) def
  /Ordering (Japan1) def
  /Supplement 6 def
end def
/CMapName /Demo-RKSJ-H def
/CMapVersion 10.001 def
/CMapType 1 def
/WMode 0 def
4 begincodespacerange
  <00>   <80>
  <8140> <9FFC>
  <A0>   <DF>
  <E040> <FCFC>
endcodespacerange
1 beginnotdefrange
<80> <80> 1
endnotdefrange
3 begincidrange
<20> <7E> 231
<8140> <817E> 633
<A1> <DF> 326
endcidrange
2 begincidchar
<8194> 728
<8190> 724
endcidchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end
%%EndResource
%%EOF
"#;

/// A ToUnicode-style CMap with bf sections.
const TOUNICODE_CMAP: &str = r#"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0024> <0041>
endbfchar
1 beginbfrange
<0041> <005A> <0061>
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end
"#;

#[test]
fn test_cid_cmap_structure() {
    let cmap = cmap::read(CID_CMAP.as_bytes()).unwrap();
    assert_eq!(cmap.name.as_str(), "Demo-RKSJ-H");
    assert_eq!(cmap.info.codespace_ranges.len(), 4);
    assert_eq!(cmap.info.ranges.len(), 3);
    assert_eq!(cmap.info.chars.len(), 2);
    assert_eq!(cmap.info.notdef_ranges.len(), 1);
}

#[test]
fn test_cid_cmap_dictionary_entries() {
    let cmap = cmap::read(CID_CMAP.as_bytes()).unwrap();
    assert_eq!(
        cmap.dict.get("CMapName").unwrap().as_name().unwrap().as_str(),
        "Demo-RKSJ-H"
    );
    assert_eq!(cmap.dict.get("WMode").unwrap().as_integer(), Some(0));
    let system_info = cmap.dict.get("CIDSystemInfo").unwrap();
    let system_info = system_info.as_dict().unwrap();
    assert_eq!(
        system_info.get("Registry").unwrap().as_string().unwrap().bytes(),
        b"Adobe"
    );
    assert_eq!(system_info.get("Supplement").unwrap().as_integer(), Some(6));
}

#[test]
fn test_cid_cmap_sorted_vectors() {
    let cmap = cmap::read(CID_CMAP.as_bytes()).unwrap();
    // Codespace ranges: one-byte ranges first, then two-byte, each by low.
    let lows: Vec<Vec<u8>> = cmap
        .info
        .codespace_ranges
        .iter()
        .map(|r| r.low.clone())
        .collect();
    assert_eq!(
        lows,
        vec![
            vec![0x00],
            vec![0xA0],
            vec![0x81, 0x40],
            vec![0xE0, 0x40],
        ]
    );
    // Chars sorted by source code even though declared out of order.
    assert_eq!(cmap.info.chars[0].src, vec![0x81, 0x90]);
    assert_eq!(cmap.info.chars[1].src, vec![0x81, 0x94]);
}

#[test]
fn test_cmap_determinism_across_runs() {
    let a = cmap::read(CID_CMAP.as_bytes()).unwrap();
    let b = cmap::read(CID_CMAP.as_bytes()).unwrap();
    assert_eq!(a.info.codespace_ranges, b.info.codespace_ranges);
    assert_eq!(a.info.chars.len(), b.info.chars.len());
    for (x, y) in a.info.chars.iter().zip(b.info.chars.iter()) {
        assert_eq!(x.src, y.src);
        assert!(x.dst.ps_eq(&y.dst));
    }
    for (x, y) in a.info.ranges.iter().zip(b.info.ranges.iter()) {
        assert_eq!(x.low, y.low);
        assert_eq!(x.high, y.high);
        assert!(x.dst.ps_eq(&y.dst));
    }
}

#[test]
fn test_tounicode_cmap() {
    let cmap = cmap::read(TOUNICODE_CMAP.as_bytes()).unwrap();
    assert_eq!(cmap.name.as_str(), "Adobe-Identity-UCS");
    assert_eq!(cmap.info.chars.len(), 2);
    match &cmap.info.chars[0].dst {
        Object::String(s) => assert_eq!(s.bytes(), vec![0x00, 0x20]),
        other => panic!("expected string destination, got {}", other.type_name()),
    }
    assert_eq!(cmap.info.ranges.len(), 1);
    assert_eq!(cmap.info.ranges[0].low, vec![0x00, 0x41]);
    assert_eq!(cmap.info.ranges[0].high, vec![0x00, 0x5A]);
}

#[test]
fn test_dsc_comments_from_cmap_header() {
    let mut interp = Interpreter::new();
    interp.execute_string(CID_CMAP).unwrap();
    let titles: Vec<&str> = interp
        .dsc_comments
        .iter()
        .filter(|c| c.key == "Title")
        .map(|c| c.value.as_str())
        .collect();
    assert_eq!(titles, vec!["(Demo-RKSJ-H Adobe Japan1 6)"]);
}

#[test]
fn test_max_ops_budget_applies_to_cmaps() {
    let mut interp = Interpreter::new();
    interp.max_ops = 50;
    assert!(interp.execute_string(CID_CMAP).is_err());
}

#[test]
fn test_registered_in_cmap_category() {
    let mut interp = Interpreter::new();
    interp.execute_string(TOUNICODE_CMAP).unwrap();
    let directory = interp.cmap_directory();
    assert!(directory.contains_key("Adobe-Identity-UCS"));
}
