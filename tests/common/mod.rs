#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;

/// Builds EPUB archives file by file.
pub struct EpubBuilder {
    files: Vec<(String, Vec<u8>)>,
    container: bool,
}

impl EpubBuilder {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            container: true,
        }
    }

    pub fn without_container(mut self) -> Self {
        self.container = false;
        self
    }

    pub fn file(mut self, name: &str, content: &str) -> Self {
        self.files.push((name.to_string(), content.as_bytes().to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        zip.start_file(
            "mimetype",
            options.compression_method(zip::CompressionMethod::Stored),
        )
        .unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        if self.container {
            zip.start_file("META-INF/container.xml", options).unwrap();
            zip.write_all(CONTAINER.as_bytes()).unwrap();
        }

        for (name, content) in self.files {
            zip.start_file(name, options).unwrap();
            zip.write_all(&content).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }
}

const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

pub fn xhtml(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{title}</title></head>
<body>{body}</body>
</html>"#
    )
}

/// A two-chapter EPUB 3 book with a nav document and an NCX.
pub fn sample_epub() -> Vec<u8> {
    EpubBuilder::new()
        .file(
            "OEBPS/content.opf",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Test Book</dc:title>
    <dc:creator>Test Author</dc:creator>
    <dc:language>en</dc:language>
    <dc:identifier id="uid">urn:isbn:9780306406157</dc:identifier>
    <dc:subject>Fiction</dc:subject>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="ch1" href="text/chapter1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/chapter2.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#,
        )
        .file(
            "OEBPS/nav.xhtml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<body>
  <nav epub:type="toc">
    <ol>
      <li><a href="text/chapter1.xhtml">The Beginning</a>
        <ol><li><a href="text/chapter1.xhtml#part">A Section</a></li></ol>
      </li>
      <li><a href="text/chapter2.xhtml">The End</a></li>
    </ol>
  </nav>
</body>
</html>"#,
        )
        .file(
            "OEBPS/toc.ncx",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <navMap>
    <navPoint id="np1"><navLabel><text>NCX One</text></navLabel><content src="text/chapter1.xhtml"/></navPoint>
    <navPoint id="np2"><navLabel><text>NCX Two</text></navLabel><content src="text/chapter2.xhtml"/></navPoint>
  </navMap>
</ncx>"#,
        )
        .file(
            "OEBPS/text/chapter1.xhtml",
            &xhtml(
                "Chapter 1",
                "<p>Hello, this is the first chapter.</p>",
            ),
        )
        .file(
            "OEBPS/text/chapter2.xhtml",
            &xhtml(
                "Chapter 2",
                "<p>The cat sat on the mat.</p><p>The dog slept by the door.</p>",
            ),
        )
        .build()
}

/// Write `data` to `name` inside `dir` and return the path.
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("Failed to write test file");
    path
}
